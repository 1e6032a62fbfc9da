//! Order lifecycle endpoints.
//!
//! `/orders/:id/start` is where the kitchen and the stockroom meet: it
//! is the single place the consumption engine fires. The handler wins
//! the guarded `pending → in_progress` transition before the engine
//! runs, so a double-tap never deducts twice.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::app::dto;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use bistro_core::validation::{validate_order_lines, validate_payment_amount, validate_quantity};
use bistro_core::OrderStatus;
use bistro_db::NewOrderLine;

const LIST_PAGE: u32 = 100;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/lines", post(add_lines))
        .route("/:id/start", post(start_order))
        .route("/:id/ready", post(ready_order))
        .route("/:id/serve", post(serve_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/payments", get(list_payments).post(add_payment))
        .route("/:id/close", post(close_order))
}

fn to_new_lines(lines: Vec<dto::OrderLineInput>) -> Result<Vec<NewOrderLine>, ApiError> {
    validate_order_lines(lines.len())?;
    lines
        .into_iter()
        .map(|l| {
            validate_quantity(l.quantity)?;
            Ok(NewOrderLine {
                menu_item_id: l.menu_item_id,
                quantity: l.quantity,
                note: l.note,
            })
        })
        .collect()
}

/// POST /orders
pub async fn create_order(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> Result<(StatusCode, Json<dto::OrderDto>), ApiError> {
    if body.lines.is_empty() {
        return Err(ApiError::validation("order must have at least one line"));
    }
    if body.guest_count < 1 {
        return Err(ApiError::validation("guestCount must be positive"));
    }
    let lines = to_new_lines(body.lines)?;

    let order = state
        .db
        .orders()
        .create(
            body.table_id.as_deref(),
            body.guest_count,
            &current.user_id,
            body.note.as_deref(),
            &lines,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
}

/// GET /orders?status=pending
pub async fn list_orders(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<dto::OrderDto>>, ApiError> {
    let orders = state.db.orders().list(query.status, LIST_PAGE).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/:id
pub async fn get_order(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::OrderDetailDto>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &id))?;
    let lines = state.db.orders().get_lines(&id).await?;

    Ok(Json(dto::OrderDetailDto {
        order: order.into(),
        lines: lines.into_iter().map(Into::into).collect(),
    }))
}

/// POST /orders/:id/lines
pub async fn add_lines(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddLinesRequest>,
) -> Result<Json<dto::OrderDetailDto>, ApiError> {
    if body.lines.is_empty() {
        return Err(ApiError::validation("no lines to add"));
    }
    let lines = to_new_lines(body.lines)?;

    let order = state.db.orders().add_lines(&id, &lines).await?;
    let lines = state.db.orders().get_lines(&id).await?;

    Ok(Json(dto::OrderDetailDto {
        order: order.into(),
        lines: lines.into_iter().map(Into::into).collect(),
    }))
}

/// POST /orders/:id/start
///
/// Claims the ticket with the guarded `pending → in_progress`
/// transition FIRST, then fires the consumption engine. Of two
/// concurrent starts only one wins the transition, so the engine can
/// never run twice for one order; the loser gets a 409 without having
/// touched stock. A refused consumption hands the claim back so the
/// ticket can be retried after a restock.
///
/// ## Failure modes
/// - unknown order → 404
/// - order not pending → 409, engine never runs
/// - insufficient stock → 400 listing every shortfall, nothing
///   deducted, order back in `pending`
pub async fn start_order(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::StartOrderResponse>, ApiError> {
    let order = state
        .db
        .orders()
        .set_status(&id, OrderStatus::Pending, OrderStatus::InProgress)
        .await?;

    let report = match state.db.consumption().consume_order(&id).await {
        Ok(report) => report,
        Err(err) => {
            // Release the claim; a stuck in_progress ticket with no
            // deduction would be unstartable forever.
            if let Err(revert_err) = state.db.orders().revert_to_pending(&id).await {
                error!(
                    order_number = order.order_number,
                    error = %revert_err,
                    "Failed to release order claim after refused consumption"
                );
            }
            return Err(err.into());
        }
    };

    info!(
        order_number = order.order_number,
        deductions = report.deductions.len(),
        "Order started"
    );

    Ok(Json(dto::StartOrderResponse::new(order, report)))
}

/// POST /orders/:id/ready
pub async fn ready_order(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::OrderDto>, ApiError> {
    let order = state
        .db
        .orders()
        .set_status(&id, OrderStatus::InProgress, OrderStatus::Ready)
        .await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/serve
pub async fn serve_order(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::OrderDto>, ApiError> {
    let order = state
        .db
        .orders()
        .set_status(&id, OrderStatus::Ready, OrderStatus::Served)
        .await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/cancel
///
/// Legal from pending, in_progress, or ready. Stock already consumed is
/// NOT restored automatically; write an adjustment if the food went back
/// on the shelf.
pub async fn cancel_order(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::OrderDto>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &id))?;

    let order = state
        .db
        .orders()
        .set_status(&id, order.status, OrderStatus::Cancelled)
        .await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/payments
pub async fn add_payment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<dto::PaymentRequest>,
) -> Result<(StatusCode, Json<dto::PaymentDto>), ApiError> {
    validate_payment_amount(body.amount_cents)?;
    if let Some(tendered) = body.tendered_cents {
        if tendered < body.amount_cents {
            return Err(ApiError::validation(
                "tenderedCents cannot be less than amountCents",
            ));
        }
    }

    let payment = state
        .db
        .orders()
        .add_payment(
            &id,
            body.method,
            body.amount_cents,
            body.tendered_cents,
            &current.user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// GET /orders/:id/payments
pub async fn list_payments(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<dto::PaymentDto>>, ApiError> {
    state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &id))?;

    let payments = state.db.orders().get_payments(&id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// POST /orders/:id/close
pub async fn close_order(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<dto::OrderDto>, ApiError> {
    let order = state.db.orders().close(&id).await?;
    Ok(Json(order.into()))
}
