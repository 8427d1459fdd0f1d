#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use canteen_client::{
    config::parse_base_url,
    models::{Food, Order, OrderItem, OrderOwner, Role, User},
    order_status::OrderStatus,
    session::{Claims, TokenStorage},
    state::AppState,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

pub const SECRET: &[u8] = b"canteen-test-secret";

/// In-memory canteen backend speaking the same envelope as the real one.
#[derive(Default)]
pub struct Db {
    pub users: Vec<User>,
    pub foods: Vec<Food>,
    pub orders: Vec<Order>,
    pub otps: HashMap<String, String>,
    pub echo: OtpEcho,
    pub fail_next: Option<(StatusCode, String)>,
    next_code: u32,
}

/// How a code send acknowledges dev mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OtpEcho {
    /// `"otp": "<code>"`
    #[default]
    Code,
    /// `"dev_otp": true`, as the production backend sends in dev mode.
    Flag,
    Off,
}

pub type Shared = Arc<Mutex<Db>>;

pub struct MockBackend {
    pub addr: SocketAddr,
    pub db: Shared,
    hits: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct Backend {
    db: Shared,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub async fn start() -> anyhow::Result<Self> {
        let db: Shared = Arc::new(Mutex::new(Db {
            next_code: 123_456,
            ..Db::default()
        }));
        let hits = Arc::new(AtomicUsize::new(0));
        let backend = Backend {
            db: db.clone(),
            hits: hits.clone(),
        };

        let api = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(send_code))
            .route("/auth/admin-login", post(send_code))
            .route("/auth/verify-otp", post(verify_otp))
            .route("/foods", get(list_foods).post(create_food))
            .route("/foods/{id}", put(update_food).delete(delete_food))
            .route("/orders", post(create_order))
            .route("/orders/user", get(user_orders))
            .route("/orders/admin", get(admin_orders))
            .route("/orders/{id}", patch(update_status))
            .layer(middleware::from_fn_with_state(backend.clone(), count_and_inject))
            .with_state(backend);
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, db, hits })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn app_state(&self, storage: Arc<dyn TokenStorage>) -> anyhow::Result<AppState> {
        Ok(AppState::new(parse_base_url(&self.base_url())?, storage)?)
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn db(&self) -> std::sync::MutexGuard<'_, Db> {
        self.db.lock().unwrap()
    }

    /// Makes the next request fail with `status` and `message`.
    pub fn fail_next(&self, status: StatusCode, message: &str) {
        self.db().fail_next = Some((status, message.to_string()));
    }

    pub fn add_user(&self, name: &str, email: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: Some("9876543210".into()),
            role,
            created_at: Some(Utc::now()),
        };
        self.db().users.push(user.clone());
        user
    }

    pub fn add_food(&self, name: &str, price: i64, category: &str, available: bool) -> Food {
        let food = Food {
            id: Uuid::new_v4(),
            name: name.into(),
            price: Decimal::from(price),
            category: Some(category.into()),
            is_available: available,
            image_url: None,
            description: None,
        };
        self.db().foods.push(food.clone());
        food
    }

    pub fn add_order(&self, user: &User, status: OrderStatus, total: i64) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            user_id: Some(user.id),
            status,
            total_price: Decimal::from(total),
            items: vec![],
            note: None,
            created_at: Utc::now(),
            owner: Some(owner_of(user)),
        };
        self.db().orders.push(order.clone());
        order
    }

    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.db().orders.iter().find(|o| o.id == id).cloned()
    }
}

pub fn mint_token(user: &User, ttl: Duration) -> String {
    mint_token_with(user, ttl, SECRET)
}

pub fn mint_token_with(user: &User, ttl: Duration, secret: &[u8]) -> String {
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        email: Some(user.email.clone()),
        name: Some(user.name.clone()),
        exp: (Utc::now() + ttl).timestamp(),
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
}

fn owner_of(user: &User) -> OrderOwner {
    OrderOwner {
        name: Some(user.name.clone()),
        email: Some(user.email.clone()),
        phone: user.phone.clone(),
    }
}

fn ok<T: serde::Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (
        status,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

async fn count_and_inject(State(backend): State<Backend>, req: Request, next: Next) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let injected = backend.db.lock().unwrap().fail_next.take();
    match injected {
        Some((status, message)) => fail(status, &message),
        None => next.run(req).await,
    }
}

fn caller(backend: &Backend, headers: &HeaderMap) -> Result<User, Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Access token required"))?;
    let claims = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(SECRET),
        &Validation::default(),
    )
    .map_err(|_| fail(StatusCode::UNAUTHORIZED, "Invalid or expired token"))?
    .claims;
    let db = backend.db.lock().unwrap();
    db.users
        .iter()
        .find(|u| u.id.to_string() == claims.sub)
        .cloned()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "User not found"))
}

fn admin(backend: &Backend, headers: &HeaderMap) -> Result<User, Response> {
    let user = caller(backend, headers)?;
    if user.role != Role::Admin {
        return Err(fail(StatusCode::FORBIDDEN, "Admin access required"));
    }
    Ok(user)
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    phone: String,
}

async fn register(State(backend): State<Backend>, Json(body): Json<RegisterBody>) -> Response {
    let mut db = backend.db.lock().unwrap();
    if db.users.iter().any(|u| u.email == body.email) {
        return fail(StatusCode::BAD_REQUEST, "User already exists");
    }
    let user = User {
        id: Uuid::new_v4(),
        name: body.name,
        email: body.email,
        phone: Some(body.phone),
        role: Role::User,
        created_at: Some(Utc::now()),
    };
    db.users.push(user.clone());
    ok(StatusCode::CREATED, "User registered successfully", user)
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

async fn send_code(State(backend): State<Backend>, Json(body): Json<EmailBody>) -> Response {
    let mut db = backend.db.lock().unwrap();
    if !db.users.iter().any(|u| u.email == body.email) {
        return fail(StatusCode::NOT_FOUND, "User not found");
    }
    let code = db.next_code.to_string();
    db.next_code += 1;
    db.otps.insert(body.email.clone(), code.clone());
    let data = match db.echo {
        OtpEcho::Code => json!({ "email": body.email, "otp": code }),
        OtpEcho::Flag => json!({ "email": body.email, "dev_otp": true }),
        OtpEcho::Off => json!({ "email": body.email }),
    };
    ok(StatusCode::OK, "OTP sent to your email", data)
}

#[derive(Deserialize)]
struct VerifyBody {
    email: String,
    otp: String,
}

async fn verify_otp(State(backend): State<Backend>, Json(body): Json<VerifyBody>) -> Response {
    let mut db = backend.db.lock().unwrap();
    if db.otps.get(&body.email) != Some(&body.otp) {
        return fail(StatusCode::UNAUTHORIZED, "Invalid or expired OTP");
    }
    db.otps.remove(&body.email);
    let Some(user) = db.users.iter().find(|u| u.email == body.email) else {
        return fail(StatusCode::NOT_FOUND, "User not found");
    };
    let token = mint_token(user, Duration::hours(24));
    ok(StatusCode::OK, "Login successful", json!({ "access_token": token }))
}

#[derive(Deserialize)]
struct FoodParams {
    all: Option<bool>,
    category: Option<String>,
}

async fn list_foods(State(backend): State<Backend>, Query(params): Query<FoodParams>) -> Response {
    let db = backend.db.lock().unwrap();
    let foods: Vec<&Food> = db
        .foods
        .iter()
        .filter(|f| params.all.unwrap_or(false) || f.is_available)
        .filter(|f| {
            params
                .category
                .as_deref()
                .is_none_or(|c| f.category.as_deref() == Some(c))
        })
        .collect();
    ok(StatusCode::OK, "Foods fetched", foods)
}

async fn create_food(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = admin(&backend, &headers) {
        return resp;
    }
    let food = Food {
        id: Uuid::new_v4(),
        name: body["name"].as_str().unwrap_or_default().to_string(),
        price: serde_json::from_value(body["price"].clone()).unwrap_or_default(),
        category: body["category"].as_str().map(str::to_string),
        is_available: body["is_available"].as_bool().unwrap_or(true),
        image_url: body["image_url"].as_str().map(str::to_string),
        description: None,
    };
    backend.db.lock().unwrap().foods.push(food.clone());
    ok(StatusCode::CREATED, "Food created", food)
}

async fn update_food(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = admin(&backend, &headers) {
        return resp;
    }
    let mut db = backend.db.lock().unwrap();
    let Some(food) = db.foods.iter_mut().find(|f| f.id == id) else {
        return fail(StatusCode::NOT_FOUND, "Food not found");
    };
    if let Some(name) = body["name"].as_str() {
        food.name = name.to_string();
    }
    if let Ok(price) = serde_json::from_value::<Decimal>(body["price"].clone()) {
        food.price = price;
    }
    if let Some(category) = body["category"].as_str() {
        food.category = Some(category.to_string());
    }
    if let Some(available) = body["is_available"].as_bool() {
        food.is_available = available;
    }
    if let Some(image_url) = body["image_url"].as_str() {
        food.image_url = Some(image_url.to_string());
    }
    ok(StatusCode::OK, "Food updated", food.clone())
}

async fn delete_food(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(resp) = admin(&backend, &headers) {
        return resp;
    }
    let mut db = backend.db.lock().unwrap();
    let before = db.foods.len();
    db.foods.retain(|f| f.id != id);
    if db.foods.len() == before {
        return fail(StatusCode::NOT_FOUND, "Food not found");
    }
    ok(StatusCode::OK, "Food deleted", Value::Null)
}

#[derive(Deserialize)]
struct LineBody {
    food_id: Uuid,
    quantity: u32,
}

#[derive(Deserialize)]
struct OrderBody {
    items: Vec<LineBody>,
}

async fn create_order(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<OrderBody>,
) -> Response {
    let user = match caller(&backend, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let mut db = backend.db.lock().unwrap();
    let mut items = Vec::new();
    for line in &body.items {
        let Some(food) = db.foods.iter().find(|f| f.id == line.food_id) else {
            return fail(StatusCode::BAD_REQUEST, "Food item not found");
        };
        if !food.is_available {
            return fail(
                StatusCode::BAD_REQUEST,
                &format!("'{}' is currently unavailable", food.name),
            );
        }
        items.push(OrderItem {
            food_id: Some(food.id),
            quantity: line.quantity,
            price: food.price * Decimal::from(line.quantity),
        });
    }
    let order = Order {
        id: Uuid::new_v4(),
        user_id: Some(user.id),
        status: OrderStatus::Pending,
        total_price: items.iter().map(|i| i.price).sum(),
        items,
        note: None,
        created_at: Utc::now(),
        owner: Some(owner_of(&user)),
    };
    db.orders.push(order.clone());
    ok(StatusCode::CREATED, "Order placed successfully", order)
}

async fn user_orders(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let user = match caller(&backend, &headers) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = backend.db.lock().unwrap();
    let orders: Vec<&Order> = db
        .orders
        .iter()
        .filter(|o| o.user_id == Some(user.id))
        .collect();
    ok(StatusCode::OK, "Orders fetched", orders)
}

#[derive(Deserialize)]
struct StatusParams {
    status: Option<OrderStatus>,
}

async fn admin_orders(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<StatusParams>,
) -> Response {
    if let Err(resp) = admin(&backend, &headers) {
        return resp;
    }
    let db = backend.db.lock().unwrap();
    let orders: Vec<&Order> = db
        .orders
        .iter()
        .filter(|o| params.status.is_none_or(|s| o.status == s))
        .collect();
    ok(StatusCode::OK, "Orders fetched", orders)
}

#[derive(Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn update_status(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Response {
    if let Err(resp) = admin(&backend, &headers) {
        return resp;
    }
    let mut db = backend.db.lock().unwrap();
    let Some(order) = db.orders.iter_mut().find(|o| o.id == id) else {
        return fail(StatusCode::NOT_FOUND, "Order not found");
    };
    if order.status.next() != Some(body.status) {
        return fail(
            StatusCode::BAD_REQUEST,
            &format!("Cannot move order from {} to {}", order.status, body.status),
        );
    }
    order.status = body.status;
    ok(StatusCode::OK, "Order status updated", order.clone())
}
