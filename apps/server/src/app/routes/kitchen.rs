//! The kitchen display queue.

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};

use crate::app::dto;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router {
    Router::new().route("/queue", get(queue))
}

/// GET /kitchen/queue
///
/// Pending and in-progress tickets, oldest first, with their lines.
pub async fn queue(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<dto::OrderDetailDto>>, ApiError> {
    let orders = state.db.orders().kitchen_queue().await?;

    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = state.db.orders().get_lines(&order.id).await?;
        out.push(dto::OrderDetailDto {
            order: order.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        });
    }

    Ok(Json(out))
}
