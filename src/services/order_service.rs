use crate::{
    cart::Cart,
    client::ApiClient,
    dto::orders::CreateOrderRequest,
    error::{AppError, AppResult},
    models::Order,
    response::ApiResponse,
};

/// Submits the cart as a new order. The cart is cleared only once the server confirms.
pub async fn place_order(api: &ApiClient, cart: &mut Cart) -> AppResult<ApiResponse<Order>> {
    if cart.is_empty() {
        return Err(AppError::Validation("Your cart is empty".into()));
    }

    let payload = CreateOrderRequest {
        items: cart.order_lines(),
    };
    let resp: ApiResponse<Order> = api.post("orders", &payload).await?;

    cart.clear();
    cart.close();
    if let Some(order) = resp.data.as_ref() {
        tracing::info!(order_id = %order.id, total = %order.total_price, "order placed");
    }
    Ok(resp)
}

pub async fn list_user_orders(api: &ApiClient) -> AppResult<ApiResponse<Vec<Order>>> {
    let url = api.url("orders/user")?;
    api.get(url).await
}
