use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{
    client::ApiClient,
    dto::foods::{CreateFoodRequest, FoodQuery, UpdateFoodRequest},
    error::{AppError, AppResult},
    models::Food,
    response::ApiResponse,
};

pub async fn list_foods(api: &ApiClient, query: &FoodQuery) -> AppResult<ApiResponse<Vec<Food>>> {
    let mut url = api.url("foods")?;
    {
        let mut pairs = url.query_pairs_mut();
        if query.all {
            pairs.append_pair("all", "true");
        }
        if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
            pairs.append_pair("category", category);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    api.get(url).await
}

pub async fn create_food(api: &ApiClient, payload: CreateFoodRequest) -> AppResult<ApiResponse<Food>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if payload.category.trim().is_empty() {
        return Err(AppError::Validation("Category is required".into()));
    }
    if payload.price.is_sign_negative() {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }
    let resp = api.post("foods", &payload).await?;
    tracing::info!(name = %payload.name, "food item created");
    Ok(resp)
}

pub async fn update_food(
    api: &ApiClient,
    id: Uuid,
    payload: UpdateFoodRequest,
) -> AppResult<ApiResponse<Food>> {
    if payload.is_empty() {
        return Err(AppError::Validation("No fields to update".into()));
    }
    if payload.price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }
    let resp = api.put(&format!("foods/{id}"), &payload).await?;
    tracing::info!(food_id = %id, "food item updated");
    Ok(resp)
}

pub async fn toggle_availability(api: &ApiClient, food: &Food) -> AppResult<ApiResponse<Food>> {
    let payload = UpdateFoodRequest {
        is_available: Some(!food.is_available),
        ..Default::default()
    };
    update_food(api, food.id, payload).await
}

pub async fn delete_food(api: &ApiClient, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let resp = api.delete(&format!("foods/{id}")).await?;
    tracing::info!(food_id = %id, "food item deleted");
    Ok(resp)
}

/// Distinct, sorted categories present in `foods`.
pub fn categories(foods: &[Food]) -> Vec<String> {
    foods
        .iter()
        .filter_map(|f| f.category.as_deref())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Menu filter: case-insensitive search over name and description, optional category.
pub fn filter_menu<'a>(foods: &'a [Food], search: &str, category: Option<&str>) -> Vec<&'a Food> {
    let needle = search.trim().to_lowercase();
    foods
        .iter()
        .filter(|f| {
            needle.is_empty()
                || f.name.to_lowercase().contains(&needle)
                || f
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .filter(|f| category.is_none_or(|c| f.category.as_deref() == Some(c)))
        .collect()
}

/// Looks a food up by id prefix or case-insensitive exact name.
pub fn find_food<'a>(foods: &'a [Food], key: &str) -> Option<&'a Food> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    foods
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(key))
        .or_else(|| {
            let mut matches = foods.iter().filter(|f| f.id.to_string().starts_with(key));
            match (matches.next(), matches.next()) {
                (Some(only), None) => Some(only),
                _ => None,
            }
        })
}
