use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CreateFoodRequest {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub is_available: bool,
    pub image_url: Option<String>,
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateFoodRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl UpdateFoodRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.is_available.is_none()
            && self.image_url.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoodQuery {
    /// Include unavailable items (admin listing).
    pub all: bool,
    pub category: Option<String>,
}
