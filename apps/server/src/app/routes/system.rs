//! Liveness endpoint (unauthenticated).

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub migrations_total: usize,
    pub migrations_applied: usize,
}

/// GET /health
pub async fn health(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    if !state.db.health_check().await {
        return Err(ApiError::internal("Database unreachable"));
    }

    let (total, applied) = state.db.migration_status().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        migrations_total: total,
        migrations_applied: applied,
    }))
}
