use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{dto::orders::OrderLine, models::Food};

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub food_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// In-memory cart. Lives as long as the front-end session and is never persisted.
#[derive(Debug, Default, Clone)]
pub struct Cart {
    items: Vec<CartItem>,
    is_open: bool,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, food_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.food_id == food_id)
    }

    pub fn add_item(&mut self, food: &Food) {
        match self.items.iter_mut().find(|item| item.food_id == food.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                food_id: food.id,
                name: food.name.clone(),
                price: food.price,
                quantity: 1,
                image_url: food.image_url.clone(),
            }),
        }
    }

    /// Sets the quantity exactly; zero or below removes the item.
    pub fn update_quantity(&mut self, food_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(food_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|item| item.food_id == food_id) {
            item.quantity = quantity;
        }
    }

    pub fn remove_item(&mut self, food_id: Uuid) {
        self.items.retain(|item| item.food_id != food_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Payload lines for `POST /orders`.
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|item| OrderLine {
                food_id: item.food_id,
                quantity: item.quantity,
            })
            .collect()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }
}
