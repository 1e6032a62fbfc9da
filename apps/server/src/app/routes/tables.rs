//! Dining table CRUD (the floor plan).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::app::dto;
use crate::error::ApiError;
use crate::state::AppState;
use bistro_core::validation::validate_name;
use bistro_core::DiningTable;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tables).post(create_table))
        .route("/:id", get(get_table).put(update_table).delete(delete_table))
}

/// GET /tables
pub async fn list_tables(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<dto::TableDto>>, ApiError> {
    let tables = state.db.tables().list_active().await?;
    Ok(Json(tables.into_iter().map(Into::into).collect()))
}

/// POST /tables
pub async fn create_table(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::CreateTableRequest>,
) -> Result<(StatusCode, Json<dto::TableDto>), ApiError> {
    validate_name("name", &body.name)?;
    if body.seats < 1 {
        return Err(ApiError::validation("seats must be positive"));
    }

    let now = Utc::now();
    let table = DiningTable {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        zone: body.zone,
        seats: body.seats,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.tables().insert(&table).await?;

    Ok((StatusCode::CREATED, Json(table.into())))
}

/// GET /tables/:id
pub async fn get_table(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::TableDto>, ApiError> {
    let table = state
        .db
        .tables()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Table", &id))?;
    Ok(Json(table.into()))
}

/// PUT /tables/:id
pub async fn update_table(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTableRequest>,
) -> Result<Json<dto::TableDto>, ApiError> {
    validate_name("name", &body.name)?;

    let mut table = state
        .db
        .tables()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Table", &id))?;

    table.name = body.name.trim().to_string();
    table.zone = body.zone;
    table.seats = body.seats;
    table.is_active = body.is_active;
    state.db.tables().update(&table).await?;

    Ok(Json(table.into()))
}

/// DELETE /tables/:id (soft delete)
pub async fn delete_table(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.tables().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
