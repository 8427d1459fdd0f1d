use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    client::ApiClient,
    dto::orders::{DashboardStats, OrderListQuery, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    models::{Food, Order},
    order_status::OrderStatus,
    response::ApiResponse,
};

pub const RECENT_ORDERS: usize = 5;

pub async fn list_all_orders(
    api: &ApiClient,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let mut url = api.url("orders/admin")?;
    if let Some(status) = query.status {
        url.query_pairs_mut().append_pair("status", status.as_str());
    }
    api.get(url).await
}

/// Moves an order one step along its progression.
///
/// No optimistic update: callers keep their list as-is and refetch on success.
pub async fn advance_order(api: &ApiClient, order: &Order) -> AppResult<ApiResponse<Order>> {
    let next = order.status.next().ok_or_else(|| {
        AppError::Validation(format!("Order {} is already {}", order.id, order.status))
    })?;
    update_order_status(api, order, next).await
}

pub async fn update_order_status(
    api: &ApiClient,
    order: &Order,
    status: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    let payload = UpdateOrderStatusRequest { status };
    let resp = api.patch(&format!("orders/{}", order.id), &payload).await;
    match &resp {
        Ok(_) => tracing::info!(order_id = %order.id, from = %order.status, to = %status, "order status updated"),
        Err(err) => tracing::warn!(order_id = %order.id, error = %err, "order status update failed"),
    }
    resp
}

pub fn filter_by_status(orders: &[Order], status: Option<OrderStatus>) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| status.is_none_or(|s| o.status == s))
        .collect()
}

pub fn status_counts(orders: &[Order]) -> BTreeMap<OrderStatus, usize> {
    let mut counts: BTreeMap<OrderStatus, usize> =
        OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for order in orders {
        *counts.entry(order.status).or_default() += 1;
    }
    counts
}

/// Dashboard figures. `orders` is expected newest first, as the backend returns them.
pub fn dashboard_stats(foods: &[Food], orders: &[Order]) -> DashboardStats {
    DashboardStats {
        total_items: foods.len(),
        total_orders: orders.len(),
        pending: orders
            .iter()
            .filter(|o| matches!(o.status, OrderStatus::Pending | OrderStatus::Preparing))
            .count(),
        revenue: orders.iter().map(|o| o.total_price).sum::<Decimal>(),
        recent: orders.iter().take(RECENT_ORDERS).cloned().collect(),
    }
}
