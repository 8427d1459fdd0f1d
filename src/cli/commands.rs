use crate::{
    config::AppConfig,
    dto::{
        auth::RegisterRequest,
        foods::{CreateFoodRequest, FoodQuery, UpdateFoodRequest},
        orders::OrderListQuery,
    },
    error::{AppError, AppResult},
    fetcher::Resource,
    guard::Page,
    models::{Food, Order},
    otp::LoginSurface,
    services::{admin_service, food_service, order_service},
    state::AppState,
};

use super::{AdminAction, Cli, Command, Input, enter, login, render, report, shell::Shell};

pub async fn run(cli: Cli, config: AppConfig) -> AppResult<()> {
    let state = AppState::from_config(&config)?;
    state.session.restore();

    let result = dispatch(&state, &config, cli.command).await;
    if let Err(err) = &result {
        report(&state, err);
    }
    result
}

async fn dispatch(state: &AppState, config: &AppConfig, command: Command) -> AppResult<()> {
    let mut input = Input::stdin();
    match command {
        Command::Register { name, email, phone } => {
            let resp = state
                .session
                .register(RegisterRequest { name, email, phone })
                .await?;
            println!("{}", resp.message);
            println!("You can now log in with 'canteen login'.");
        }
        Command::Login { admin, email } => {
            let surface = if admin {
                LoginSurface::Admin
            } else {
                LoginSurface::User
            };
            let page = login(state, config, &mut input, surface, email, Page::Menu).await?;
            println!("Continue at {}", page.path());
        }
        Command::Logout => {
            state.session.logout();
            println!("Logged out.");
        }
        Command::Whoami => {
            let session = state.session.current().filter(|_| state.session.is_authenticated());
            println!("{}", render::session(session.as_ref()));
        }
        Command::Menu { category, search } => {
            let query = FoodQuery {
                all: false,
                category,
            };
            let foods = load_foods(state, query).await?;
            let shown = food_service::filter_menu(&foods, search.as_deref().unwrap_or(""), None);
            print!("{}", render::menu(&shown, false));
            let categories = food_service::categories(&foods);
            if !categories.is_empty() {
                println!("Categories: {}", categories.join(", "));
            }
        }
        Command::Orders => {
            enter(state, config, &mut input, Page::Orders).await?;
            let orders = load_user_orders(state).await?;
            if orders.is_empty() {
                println!("No orders yet.");
            }
            for order in &orders {
                println!("{}", render::customer_order(order));
            }
        }
        Command::Shell => {
            Shell::new(state.clone(), config.clone(), input).run().await?;
        }
        Command::Admin { action } => {
            let page = match action {
                AdminAction::Dashboard => Page::AdminDashboard,
                AdminAction::Orders { .. } | AdminAction::Advance { .. } => Page::AdminOrders,
                _ => Page::AdminFoods,
            };
            enter(state, config, &mut input, page).await?;
            admin(state, action).await?;
        }
    }
    Ok(())
}

async fn admin(state: &AppState, action: AdminAction) -> AppResult<()> {
    let api = &state.api;
    match action {
        AdminAction::Dashboard => {
            let foods = load_foods(state, FoodQuery::default()).await?;
            let orders = load_admin_orders(state, OrderListQuery::default()).await?;
            print!("{}", render::dashboard(&admin_service::dashboard_stats(&foods, &orders)));
        }
        AdminAction::Foods => {
            let foods = load_foods(
                state,
                FoodQuery {
                    all: true,
                    category: None,
                },
            )
            .await?;
            let all: Vec<&Food> = foods.iter().collect();
            print!("{}", render::menu(&all, true));
        }
        AdminAction::FoodAdd {
            name,
            price,
            category,
            image_url,
            unavailable,
        } => {
            let payload = CreateFoodRequest {
                name,
                price,
                category,
                is_available: !unavailable,
                image_url: image_url.filter(|u| !u.is_empty()),
            };
            let food = food_service::create_food(api, payload).await?.into_data()?;
            println!("Added {} ({})", food.name, food.id);
        }
        AdminAction::FoodUpdate {
            id,
            name,
            price,
            category,
            image_url,
        } => {
            let payload = UpdateFoodRequest {
                name,
                price,
                category,
                is_available: None,
                image_url,
            };
            let food = food_service::update_food(api, id, payload).await?.into_data()?;
            println!("Updated {}", food.name);
        }
        AdminAction::FoodToggle { id } => {
            let foods = load_foods(
                state,
                FoodQuery {
                    all: true,
                    category: None,
                },
            )
            .await?;
            let food = foods
                .iter()
                .find(|f| f.id == id)
                .ok_or_else(|| AppError::Validation(format!("No food item with id {id}")))?;
            let updated = food_service::toggle_availability(api, food).await?.into_data()?;
            let state_label = if updated.is_available {
                "available"
            } else {
                "unavailable"
            };
            println!("{} is now {state_label}", updated.name);
        }
        AdminAction::FoodDelete { id } => {
            let resp = food_service::delete_food(api, id).await?;
            println!("{}", resp.message);
        }
        AdminAction::Orders { status } => {
            let orders = load_admin_orders(state, OrderListQuery::default()).await?;
            println!("{}", render::status_filter(&admin_service::status_counts(&orders)));
            for order in admin_service::filter_by_status(&orders, status) {
                println!("{}", render::admin_order(order));
            }
        }
        AdminAction::Advance { id } => {
            let orders = load_admin_orders(state, OrderListQuery::default()).await?;
            let order = find_order(&orders, &id)?;
            let updated = admin_service::advance_order(api, order).await?.into_data()?;
            println!("Order updated to {}", updated.status);
        }
    }
    Ok(())
}

pub(super) fn find_order<'a>(orders: &'a [Order], key: &str) -> AppResult<&'a Order> {
    let key = key.trim().trim_start_matches('#');
    let mut matches = orders
        .iter()
        .filter(|o| !key.is_empty() && o.id.to_string().starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(order), None) => Ok(order),
        (Some(_), Some(_)) => Err(AppError::Validation(format!("'{key}' matches several orders"))),
        _ => Err(AppError::Validation(format!("No order matches '{key}'"))),
    }
}

pub(super) async fn load_foods(state: &AppState, query: FoodQuery) -> AppResult<Vec<Food>> {
    let api = state.api.clone();
    let mut foods = Resource::with_deps(
        move |query: &FoodQuery| {
            let api = api.clone();
            let query = query.clone();
            async move { food_service::list_foods(&api, &query).await }
        },
        query,
    );
    foods.ensure_loaded().await?;
    Ok(foods.data().cloned().unwrap_or_default())
}

pub(super) async fn load_user_orders(state: &AppState) -> AppResult<Vec<Order>> {
    let api = state.api.clone();
    let mut orders = Resource::new(move || {
        let api = api.clone();
        async move { order_service::list_user_orders(&api).await }
    });
    orders.ensure_loaded().await?;
    Ok(orders.data().cloned().unwrap_or_default())
}

pub(super) async fn load_admin_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<Vec<Order>> {
    let api = state.api.clone();
    let mut orders = Resource::with_deps(
        move |query: &OrderListQuery| {
            let api = api.clone();
            let query = query.clone();
            async move { admin_service::list_all_orders(&api, &query).await }
        },
        query,
    );
    orders.ensure_loaded().await?;
    Ok(orders.data().cloned().unwrap_or_default())
}
