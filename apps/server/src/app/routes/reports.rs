//! Daily sales summary and the end-of-day register close.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::app::dto;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use bistro_core::validation::validate_business_date;

pub fn router() -> Router {
    Router::new()
        .route("/daily/:date", get(daily_summary))
        .route("/close", post(close_register))
        .route("/close/:date", get(get_close))
}

/// GET /reports/daily/:date
pub async fn daily_summary(
    Extension(state): Extension<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<dto::DailySummaryDto>, ApiError> {
    validate_business_date(&date)?;

    let summary = state.db.reports().daily_summary(&date).await?;
    Ok(Json(summary.into()))
}

/// POST /reports/close
///
/// Snapshots the day's totals into an immutable register close row.
/// Refused while open tickets remain on that date, and each date can be
/// closed only once.
pub async fn close_register(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<dto::CloseRegisterRequest>,
) -> Result<(StatusCode, Json<dto::RegisterCloseDto>), ApiError> {
    current.require_register_close()?;
    validate_business_date(&body.date)?;

    let close = state
        .db
        .reports()
        .close_day(&body.date, &current.user_id, body.note.as_deref())
        .await?;

    info!(
        business_date = %close.business_date,
        gross_cents = close.gross_cents,
        "Register closed"
    );

    Ok((StatusCode::CREATED, Json(close.into())))
}

/// GET /reports/close/:date
pub async fn get_close(
    Extension(state): Extension<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<dto::RegisterCloseDto>, ApiError> {
    validate_business_date(&date)?;

    let close = state
        .db
        .reports()
        .get_close(&date)
        .await?
        .ok_or_else(|| ApiError::not_found("Register close", &date))?;
    Ok(Json(close.into()))
}
