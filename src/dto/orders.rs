use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{models::Order, order_status::OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub food_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_items: usize,
    pub total_orders: usize,
    pub pending: usize,
    pub revenue: rust_decimal::Decimal,
    pub recent: Vec<Order>,
}
