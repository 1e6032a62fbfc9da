//! Menu item CRUD and recipe management.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::app::dto;
use crate::error::ApiError;
use crate::state::AppState;
use bistro_core::validation::{
    validate_name, validate_price_cents, validate_recipe_qty_milli, validate_tax_rate_bps,
};
use bistro_core::MenuItem;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/items/:id/recipe", put(replace_recipe).get(get_recipe))
}

/// GET /menu/items
pub async fn list_items(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<dto::MenuItemDto>>, ApiError> {
    let items = state.db.menu().list_active().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// POST /menu/items
pub async fn create_item(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<dto::MenuItemDto>), ApiError> {
    validate_name("name", &body.name)?;
    validate_price_cents(body.price_cents)?;
    validate_tax_rate_bps(body.tax_rate_bps)?;

    let now = Utc::now();
    let item = MenuItem {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        category: body.category,
        price_cents: body.price_cents,
        tax_rate_bps: body.tax_rate_bps,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.menu().insert(&item).await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /menu/items/:id
pub async fn get_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::MenuItemDto>, ApiError> {
    let item = state
        .db
        .menu()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item", &id))?;
    Ok(Json(item.into()))
}

/// PUT /menu/items/:id
pub async fn update_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateMenuItemRequest>,
) -> Result<Json<dto::MenuItemDto>, ApiError> {
    validate_name("name", &body.name)?;
    validate_price_cents(body.price_cents)?;
    validate_tax_rate_bps(body.tax_rate_bps)?;

    let mut item = state
        .db
        .menu()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item", &id))?;

    item.name = body.name.trim().to_string();
    item.category = body.category;
    item.price_cents = body.price_cents;
    item.tax_rate_bps = body.tax_rate_bps;
    item.is_active = body.is_active;
    state.db.menu().update(&item).await?;

    Ok(Json(item.into()))
}

/// DELETE /menu/items/:id (soft delete)
pub async fn delete_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.menu().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /menu/items/:id/recipe
pub async fn get_recipe(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<dto::RecipeEntryDto>>, ApiError> {
    // Distinguish "no recipe" from "no such item"
    state
        .db
        .menu()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item", &id))?;

    let entries = state.db.menu().get_recipe(&id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// PUT /menu/items/:id/recipe
///
/// Replaces the recipe wholesale; an empty entry list removes the
/// item's inventory backing entirely.
pub async fn replace_recipe(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReplaceRecipeRequest>,
) -> Result<Json<Vec<dto::RecipeEntryDto>>, ApiError> {
    for entry in &body.entries {
        validate_recipe_qty_milli(entry.qty_per_unit_milli)?;
    }

    let entries: Vec<(String, i64)> = body
        .entries
        .into_iter()
        .map(|e| (e.stock_item_id, e.qty_per_unit_milli))
        .collect();

    let inserted = state.db.menu().replace_recipe(&id, &entries).await?;
    Ok(Json(inserted.into_iter().map(Into::into).collect()))
}
