use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order_status::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub food_id: Option<Uuid>,
    pub quantity: u32,
    /// Line price as computed by the server (unit price times quantity).
    pub price: Decimal,
}

/// Customer details attached to orders in the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOwner {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl OrderOwner {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    #[serde(default, alias = "order_items")]
    pub items: Vec<OrderItem>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "users")]
    pub owner: Option<OrderOwner>,
}
