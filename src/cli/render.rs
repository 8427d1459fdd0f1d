use std::fmt::Write;

use chrono::Local;

use crate::{
    cart::Cart,
    dto::orders::DashboardStats,
    models::{Food, Order},
    order_status::{OrderStatus, PROGRESS_STEPS},
    session::Session,
};

const CURRENCY: &str = "₹";

pub fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn banner() -> String {
    "SmartServe canteen. Type 'help' for commands.".to_string()
}

pub fn session(session: Option<&Session>) -> String {
    match session {
        Some(s) => format!(
            "{} <{}> ({}), token valid until {}",
            s.name,
            s.email,
            s.role.as_str(),
            s.token_expiry.with_timezone(&Local).format("%d %b %Y %H:%M")
        ),
        None => "Not logged in".to_string(),
    }
}

pub fn menu(foods: &[&Food], show_availability: bool) -> String {
    if foods.is_empty() {
        return "No items found. Try a different search or category.".to_string();
    }
    let mut out = String::new();
    for food in foods {
        let _ = write!(
            out,
            "{}  {:<28} {:>9}  {}",
            short_id(&food.id),
            food.name,
            format!("{CURRENCY}{:.2}", food.price),
            food.category.as_deref().unwrap_or("-"),
        );
        if show_availability && !food.is_available {
            out.push_str("  [unavailable]");
        }
        out.push('\n');
    }
    out
}

pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty. Add items from the menu to get started.".to_string();
    }
    let mut out = String::new();
    for item in cart.items() {
        let _ = writeln!(
            out,
            "{}  {:<28} x{:<3} {:>9}",
            short_id(&item.food_id),
            item.name,
            item.quantity,
            format!("{CURRENCY}{:.2}", item.line_total()),
        );
    }
    let _ = write!(
        out,
        "{} item(s), total {CURRENCY}{:.2}",
        cart.total_items(),
        cart.total_price()
    );
    out
}

/// Customer view: read-only tracker, never an advance action.
pub fn customer_order(order: &Order) -> String {
    let mut out = order_header(order);
    order_lines(&mut out, order);
    match order.status.progress() {
        Some(done) => {
            let steps: Vec<String> = PROGRESS_STEPS
                .iter()
                .zip(done)
                .map(|(step, done)| format!("[{}] {}", if done { "x" } else { " " }, step.label()))
                .collect();
            let _ = writeln!(out, "  {}", steps.join(" -> "));
        }
        None => {
            let _ = writeln!(out, "  Picked up. Enjoy your meal!");
        }
    }
    out
}

/// Admin view: shows the advance action, or a done marker for terminal orders.
pub fn admin_order(order: &Order) -> String {
    let mut out = order_header(order);
    if let Some(owner) = &order.owner {
        let _ = writeln!(out, "  customer: {}", owner.display_name());
    }
    order_lines(&mut out, order);
    if let Some(note) = order.note.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "  note: {note}");
    }
    match order.status.action_label() {
        Some(action) => {
            let _ = writeln!(out, "  next: {action}  (advance {})", short_id(&order.id));
        }
        None => {
            let _ = writeln!(out, "  done");
        }
    }
    out
}

pub fn status_filter(counts: &std::collections::BTreeMap<OrderStatus, usize>) -> String {
    let total: usize = counts.values().sum();
    let mut parts = vec![format!("All ({total})")];
    parts.extend(
        counts
            .iter()
            .map(|(status, count)| format!("{} ({count})", status.label())),
    );
    parts.join("  ")
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Items   {}", stats.total_items);
    let _ = writeln!(out, "Total Orders  {}", stats.total_orders);
    let _ = writeln!(out, "Pending       {}", stats.pending);
    let _ = writeln!(out, "Revenue       {CURRENCY}{:.0}", stats.revenue);
    if !stats.recent.is_empty() {
        let _ = writeln!(out, "\nRecent orders");
        for order in &stats.recent {
            out.push_str(&order_header(order));
        }
    }
    out
}

fn order_header(order: &Order) -> String {
    format!(
        "#{}  {}  {} {CURRENCY}{:.2}\n",
        short_id(&order.id),
        order.created_at.with_timezone(&Local).format("%d %b %Y %H:%M"),
        status_badge(order.status),
        order.total_price,
    )
}

/// Status label padded to a fixed width and tinted with the status color.
pub fn status_badge(status: OrderStatus) -> String {
    let label = format!("{:<16}", status.label());
    match hex_rgb(status.color()) {
        Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m{label}\x1b[0m"),
        None => label,
    }
}

fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(hex.get(at..at + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn order_lines(out: &mut String, order: &Order) {
    for item in &order.items {
        let _ = writeln!(out, "  x{} @ {CURRENCY}{}", item.quantity, item.price);
    }
}
