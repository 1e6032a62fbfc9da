//! Stock item CRUD, receiving, adjustments, and the movement trail.
//!
//! Quantity never changes through the plain update endpoint; it only
//! moves through `/receive`, `/adjust`, and the consumption engine, each
//! of which leaves a movement row behind.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::app::dto;
use crate::error::ApiError;
use crate::state::AppState;
use bistro_core::validation::validate_name;
use bistro_core::{MovementKind, StockItem};

const MOVEMENT_PAGE: u32 = 50;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item))
        .route("/items/:id/receive", post(receive_stock))
        .route("/items/:id/adjust", post(adjust_stock))
        .route("/items/:id/movements", get(list_movements))
        .route("/low", get(low_stock))
}

/// GET /stock/items
pub async fn list_items(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<dto::StockItemDto>>, ApiError> {
    let items = state.db.stock().list_active().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// POST /stock/items
pub async fn create_item(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::CreateStockItemRequest>,
) -> Result<(StatusCode, Json<dto::StockItemDto>), ApiError> {
    validate_name("name", &body.name)?;
    if body.on_hand_qty < 0 {
        return Err(ApiError::validation("onHandQty cannot be negative"));
    }
    if body.unit_cost_cents < 0 {
        return Err(ApiError::validation("unitCostCents cannot be negative"));
    }

    let now = Utc::now();
    let item = StockItem {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        unit: body.unit,
        on_hand_qty: body.on_hand_qty,
        unit_cost_cents: body.unit_cost_cents,
        reorder_level: body.reorder_level,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.stock().insert(&item).await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /stock/items/:id
pub async fn get_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::StockItemDto>, ApiError> {
    let item = state
        .db
        .stock()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock item", &id))?;
    Ok(Json(item.into()))
}

/// PUT /stock/items/:id
///
/// Descriptive fields only; `onHandQty` is absent from the request body
/// on purpose.
pub async fn update_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStockItemRequest>,
) -> Result<Json<dto::StockItemDto>, ApiError> {
    validate_name("name", &body.name)?;
    if body.unit_cost_cents < 0 {
        return Err(ApiError::validation("unitCostCents cannot be negative"));
    }

    let mut item = state
        .db
        .stock()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock item", &id))?;

    item.name = body.name.trim().to_string();
    item.unit = body.unit;
    item.unit_cost_cents = body.unit_cost_cents;
    item.reorder_level = body.reorder_level;
    item.is_active = body.is_active;
    state.db.stock().update(&item).await?;

    let fresh = state
        .db
        .stock()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock item", &id))?;
    Ok(Json(fresh.into()))
}

/// POST /stock/items/:id/receive
pub async fn receive_stock(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> Result<Json<dto::MovementDto>, ApiError> {
    if body.quantity <= 0 {
        return Err(ApiError::validation("quantity must be positive"));
    }
    if body.unit_cost_cents.is_some_and(|c| c < 0) {
        return Err(ApiError::validation("unitCostCents cannot be negative"));
    }

    let movement = state
        .db
        .stock()
        .receive(&id, body.quantity, body.unit_cost_cents)
        .await?;
    Ok(Json(movement.into()))
}

/// POST /stock/items/:id/adjust
pub async fn adjust_stock(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> Result<Json<dto::MovementDto>, ApiError> {
    if body.delta == 0 {
        return Err(ApiError::validation("delta cannot be zero"));
    }
    if body.reason.trim().is_empty() {
        return Err(ApiError::validation("reason cannot be empty"));
    }

    let kind = if body.waste {
        MovementKind::Waste
    } else {
        MovementKind::Adjustment
    };

    let movement = state
        .db
        .stock()
        .adjust(&id, body.delta, kind, body.reason.trim())
        .await?;
    Ok(Json(movement.into()))
}

/// GET /stock/items/:id/movements
pub async fn list_movements(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<dto::MovementDto>>, ApiError> {
    state
        .db
        .stock()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock item", &id))?;

    let movements = state.db.stock().movements(&id, MOVEMENT_PAGE).await?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}

/// GET /stock/low
pub async fn low_stock(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<dto::StockItemDto>>, ApiError> {
    let items = state.db.stock().low_stock().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}
