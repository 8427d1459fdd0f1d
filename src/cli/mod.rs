//! Terminal front end: one-shot commands and an interactive shell.

mod commands;
pub mod render;
mod shell;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    guard::{self, Guard, Page},
    order_status::OrderStatus,
    otp::{LoginSurface, OtpFlow, OtpStep},
    state::AppState,
};

pub use commands::run;

#[derive(Debug, Parser)]
#[command(name = "canteen")]
#[command(author, version, about = "Campus canteen ordering client")]
pub struct Cli {
    /// Backend base URL, e.g. http://localhost:5000/api
    #[arg(long, global = true, env = "CANTEEN_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a customer account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        phone: String,
    },
    /// Log in with an emailed one-time code
    Login {
        /// Use the admin login
        #[arg(long)]
        admin: bool,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the current session
    Whoami,
    /// Browse available food
    Menu {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List your orders and their progress
    Orders,
    /// Interactive session with a cart
    Shell,
    /// Canteen management
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminAction {
    /// Overview of canteen operations
    Dashboard,
    /// List all food items, including unavailable ones
    Foods,
    /// Add a food item
    FoodAdd {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        price: rust_decimal::Decimal,
        #[arg(short, long)]
        category: String,
        #[arg(long)]
        image_url: Option<String>,
        /// Create the item as unavailable
        #[arg(long)]
        unavailable: bool,
    },
    /// Change fields of a food item
    FoodUpdate {
        id: Uuid,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        price: Option<rust_decimal::Decimal>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Flip a food item between available and unavailable
    FoodToggle { id: Uuid },
    /// Delete a food item
    FoodDelete { id: Uuid },
    /// List all orders
    Orders {
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Move an order to its next status
    Advance {
        /// Order id or unique id prefix
        id: String,
    },
}

/// Line-based stdin reader shared by the prompts.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `prompt` and reads one trimmed line; `None` on end of input.
    pub async fn prompt(&mut self, prompt: &str) -> AppResult<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

/// Makes sure the visitor may open `page`, running the matching login when redirected.
pub async fn enter(
    state: &AppState,
    config: &AppConfig,
    input: &mut Input,
    page: Page,
) -> AppResult<()> {
    match guard::authorize(&state.session, page) {
        Guard::Allow => Ok(()),
        Guard::Redirect(Page::Login) => {
            println!("Please log in to continue.");
            login(state, config, input, LoginSurface::User, None, page).await?;
            guard::ensure_authenticated(&state.session)
        }
        Guard::Redirect(Page::AdminLogin) => {
            println!("Admin login required.");
            login(state, config, input, LoginSurface::Admin, None, page).await?;
            guard::ensure_admin(&state.session)
        }
        Guard::Redirect(_) => Err(AppError::Forbidden("Admin access required".into())),
    }
}

/// Drives the OTP flow on the terminal until it resolves or input ends.
pub async fn login(
    state: &AppState,
    config: &AppConfig,
    input: &mut Input,
    surface: LoginSurface,
    mut email: Option<String>,
    return_to: Page,
) -> AppResult<Page> {
    let mut flow = OtpFlow::new(surface, state.session.clone(), config.otp_cooldown)
        .returning_to(return_to);

    loop {
        match flow.step() {
            OtpStep::AwaitingEmail => {
                let address = match email.take() {
                    Some(address) => address,
                    None => {
                        let label = match surface {
                            LoginSurface::User => "Email: ",
                            LoginSurface::Admin => "Admin email: ",
                        };
                        match input.prompt(label).await? {
                            Some(address) => address,
                            None => return Err(AppError::Validation("Login cancelled".into())),
                        }
                    }
                };
                if flow.submit_email(&address).await.is_err() {
                    print_flow_error(&flow);
                    continue;
                }
                println!("We sent an OTP to {}", flow.email());
                if let Some(code) = flow.dev_code() {
                    println!("Dev OTP: {code}");
                }
            }
            OtpStep::AwaitingCode => {
                let prompt = format!("OTP [{}] (enter to verify, 'resend', 'change'): ", flow.code());
                let Some(line) = input.prompt(&prompt).await? else {
                    return Err(AppError::Validation("Login cancelled".into()));
                };
                match line.as_str() {
                    "resend" => match flow.resend().await {
                        Ok(true) => {
                            println!("A new OTP is on its way.");
                            if let Some(code) = flow.dev_code() {
                                println!("Dev OTP: {code}");
                            }
                        }
                        Ok(false) => println!("You can resend in {}s.", flow.resend_in()),
                        Err(_) => print_flow_error(&flow),
                    },
                    "change" => flow.change_email(),
                    entered => {
                        if !entered.is_empty() {
                            let code = flow.code_mut();
                            code.clear();
                            if !code.paste(entered) {
                                entered.chars().for_each(|ch| {
                                    code.type_char(ch);
                                });
                            }
                        }
                        match flow.verify().await {
                            Ok(page) => {
                                println!("Welcome, {}!", welcome_name(state));
                                return Ok(page);
                            }
                            Err(AppError::Forbidden(_)) => {
                                print_flow_error(&flow);
                                flow.change_email();
                            }
                            Err(_) => print_flow_error(&flow),
                        }
                    }
                }
            }
        }
    }
}

/// A 401 means the session is gone: drop it and point back to login.
pub fn report(state: &AppState, err: &AppError) {
    if err.is_unauthorized() {
        state.session.logout();
        eprintln!("{}", err.user_message());
        eprintln!("Please log in again ('canteen login').");
    } else {
        eprintln!("Error: {}", err.user_message());
    }
}

fn print_flow_error(flow: &OtpFlow) {
    if let Some(message) = flow.error() {
        eprintln!("{message}");
    }
}

fn welcome_name(state: &AppState) -> String {
    state
        .session
        .current()
        .map(|s| if s.name.is_empty() { s.email } else { s.name })
        .unwrap_or_default()
}
