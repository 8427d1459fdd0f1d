use crate::{
    cart::Cart,
    config::AppConfig,
    dto::foods::FoodQuery,
    error::{AppError, AppResult},
    fetcher::Resource,
    guard::Page,
    models::{Food, Order},
    otp::LoginSurface,
    services::{food_service, order_service},
    state::AppState,
};

use super::{Input, enter, login, render, report};

const HELP: &str = "\
menu [category|all]    show the menu, optionally by category
search [text]          filter the menu by name or description
add <item> [qty]       add an item by name or id prefix
qty <item> <n>         set the quantity (0 removes)
remove <item>          drop an item from the cart
cart                   show the cart
checkout               place the order
orders                 your orders and their progress
refresh                reload the menu
login | admin-login    log in with an emailed code
logout | whoami
quit";

/// Interactive session. The cart lives only as long as the shell does.
pub struct Shell {
    state: AppState,
    config: AppConfig,
    input: Input,
    cart: Cart,
    menu: Resource<Vec<Food>, FoodQuery>,
    search: String,
    splash_seen: bool,
}

impl Shell {
    pub fn new(state: AppState, config: AppConfig, input: Input) -> Self {
        let api = state.api.clone();
        let menu = Resource::with_deps(
            move |query: &FoodQuery| {
                let api = api.clone();
                let query = query.clone();
                async move { food_service::list_foods(&api, &query).await }
            },
            FoodQuery::default(),
        );
        Self {
            state,
            config,
            input,
            cart: Cart::new(),
            menu,
            search: String::new(),
            splash_seen: false,
        }
    }

    pub async fn run(mut self) -> AppResult<()> {
        if !self.splash_seen {
            println!("{}", render::banner());
            self.splash_seen = true;
        }

        loop {
            let prompt = match self.cart.total_items() {
                0 => "canteen> ".to_string(),
                n => format!("canteen [{n}]> "),
            };
            let Some(line) = self.input.prompt(&prompt).await? else {
                return Ok(());
            };
            let (command, rest) = line
                .split_once(char::is_whitespace)
                .map(|(c, r)| (c, r.trim()))
                .unwrap_or((line.as_str(), ""));

            let result = match command {
                "" => Ok(()),
                "quit" | "exit" => return Ok(()),
                "help" => {
                    println!("{HELP}");
                    Ok(())
                }
                "menu" => self.show_menu(rest).await,
                "search" => {
                    self.search = rest.to_string();
                    self.show_menu_page().await
                }
                "refresh" => self.refresh_menu().await,
                "add" => self.add(rest).await,
                "qty" => self.set_quantity(rest),
                "remove" => self.remove(rest),
                "cart" => {
                    self.cart.open();
                    println!("{}", render::cart(&self.cart));
                    Ok(())
                }
                "checkout" => self.checkout().await,
                "orders" => self.orders().await,
                "login" => self.login(LoginSurface::User).await,
                "admin-login" => self.login(LoginSurface::Admin).await,
                "logout" => {
                    self.state.session.logout();
                    println!("Logged out.");
                    Ok(())
                }
                "whoami" => {
                    let session = self
                        .state
                        .session
                        .current()
                        .filter(|_| self.state.session.is_authenticated());
                    println!("{}", render::session(session.as_ref()));
                    Ok(())
                }
                other => {
                    println!("Unknown command '{other}'. Type 'help'.");
                    Ok(())
                }
            };

            if let Err(err) = result {
                report(&self.state, &err);
            }
        }
    }

    async fn show_menu(&mut self, category: &str) -> AppResult<()> {
        let category = match category {
            "" | "all" => None,
            c => Some(c.to_string()),
        };
        self.menu
            .set_deps(FoodQuery {
                all: false,
                category,
            })
            .await?;
        self.show_menu_page().await
    }

    async fn show_menu_page(&mut self) -> AppResult<()> {
        self.menu.ensure_loaded().await?;
        let foods = self.menu.data().map(Vec::as_slice).unwrap_or_default();
        let shown = food_service::filter_menu(foods, &self.search, None);
        print!("{}", render::menu(&shown, false));
        let categories = food_service::categories(foods);
        if !categories.is_empty() {
            println!("Categories: {}", categories.join(", "));
        }
        Ok(())
    }

    async fn refresh_menu(&mut self) -> AppResult<()> {
        self.menu.refetch().await?;
        self.show_menu_page().await
    }

    async fn add(&mut self, args: &str) -> AppResult<()> {
        let (key, quantity) = split_quantity(args)?;
        self.menu.ensure_loaded().await?;
        let food = self
            .menu
            .data()
            .and_then(|foods| food_service::find_food(foods, key))
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("No menu item matches '{key}'")))?;
        if !food.is_available {
            return Err(AppError::Validation(format!(
                "'{}' is currently unavailable",
                food.name
            )));
        }

        let already = self.cart.get(food.id).map_or(0, |item| item.quantity);
        self.cart.add_item(&food);
        if quantity > 1 {
            self.cart
                .update_quantity(food.id, i64::from(already).saturating_add(i64::from(quantity)));
        }
        println!("Added {} to cart", food.name);
        Ok(())
    }

    fn set_quantity(&mut self, args: &str) -> AppResult<()> {
        let Some((key, quantity)) = args.rsplit_once(char::is_whitespace) else {
            return Err(AppError::Validation("Usage: qty <item> <n>".into()));
        };
        let quantity: i64 = quantity
            .parse()
            .map_err(|_| AppError::Validation(format!("'{quantity}' is not a quantity")))?;
        let id = self.cart_item(key.trim())?;
        self.cart.update_quantity(id, quantity);
        println!("{}", render::cart(&self.cart));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> AppResult<()> {
        let id = self.cart_item(key)?;
        self.cart.remove_item(id);
        println!("{}", render::cart(&self.cart));
        Ok(())
    }

    async fn checkout(&mut self) -> AppResult<()> {
        if self.cart.is_empty() {
            println!("{}", render::cart(&self.cart));
            return Ok(());
        }
        println!("{}", render::cart(&self.cart));
        enter(&self.state, &self.config, &mut self.input, Page::Checkout).await?;

        let order = order_service::place_order(&self.state.api, &mut self.cart)
            .await?
            .into_data()?;
        println!(
            "Order placed successfully! #{} is {}.",
            render::short_id(&order.id),
            order.status.label()
        );
        Ok(())
    }

    async fn orders(&mut self) -> AppResult<()> {
        enter(&self.state, &self.config, &mut self.input, Page::Orders).await?;
        let orders: Vec<Order> = super::commands::load_user_orders(&self.state).await?;
        if orders.is_empty() {
            println!("No orders yet.");
        }
        for order in &orders {
            println!("{}", render::customer_order(order));
        }
        Ok(())
    }

    async fn login(&mut self, surface: LoginSurface) -> AppResult<()> {
        let page = login(
            &self.state,
            &self.config,
            &mut self.input,
            surface,
            None,
            Page::Menu,
        )
        .await?;
        println!("Continue at {}", page.path());
        Ok(())
    }

    fn cart_item(&self, key: &str) -> AppResult<uuid::Uuid> {
        let key = key.trim();
        let mut matches = self.cart.items().iter().filter(|item| {
            !key.is_empty()
                && (item.name.eq_ignore_ascii_case(key) || item.food_id.to_string().starts_with(key))
        });
        match (matches.next(), matches.next()) {
            (Some(item), None) => Ok(item.food_id),
            (Some(_), Some(_)) => Err(AppError::Validation(format!("'{key}' matches several cart items"))),
            _ => Err(AppError::Validation(format!("'{key}' is not in your cart"))),
        }
    }
}

/// Splits `"<item> [qty]"`; a trailing number is the quantity.
fn split_quantity(args: &str) -> AppResult<(&str, u32)> {
    let args = args.trim();
    if args.is_empty() {
        return Err(AppError::Validation("Usage: add <item> [qty]".into()));
    }
    match args.rsplit_once(char::is_whitespace) {
        Some((key, qty)) => match qty.parse::<u32>() {
            Ok(0) => Err(AppError::Validation("Quantity must be at least 1".into())),
            Ok(n) => Ok((key.trim(), n)),
            Err(_) => Ok((args, 1)),
        },
        None => Ok((args, 1)),
    }
}
