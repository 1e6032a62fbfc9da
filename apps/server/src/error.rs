//! # API Error Type
//!
//! Unified error type for REST handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bistro POS                             │
//! │                                                                         │
//! │  Admin SPA                       Rust Backend                           │
//! │  ─────────                       ────────────                           │
//! │                                                                         │
//! │  POST /orders/17/start                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler: Result<Json<T>, ApiError>                              │  │
//! │  │                                                                  │  │
//! │  │  ConsumptionError::InsufficientStock ──► 400 INSUFFICIENT_STOCK │  │
//! │  │  ConsumptionError::OrderNotFound     ──► 404 NOT_FOUND          │  │
//! │  │  DbError::InvalidState               ──► 409 CONFLICT           │  │
//! │  │  DbError::QueryFailed                ──► 500 DATABASE_ERROR     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄─── { "code": "INSUFFICIENT_STOCK",                                  │
//! │         "message": "insufficient stock: Burger Bun (needed 2, have 1)"}│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error body carries a machine-readable `code` and a
//! human-readable `message`; the SPA switches on the code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bistro_db::{ConsumptionError, DbError};

/// API error returned from REST handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: abc-123"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses, each with a fixed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Stock cannot cover the order (400)
    InsufficientStock,

    /// Operation rejected by the current entity state (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::InvalidState { message } => ApiError::conflict(message),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Operation would violate a constraint")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts consumption engine errors to API errors.
///
/// The shortfall message lists EVERY missing ingredient, verbatim from
/// the engine, so one failed attempt tells the kitchen everything.
impl From<ConsumptionError> for ApiError {
    fn from(err: ConsumptionError) -> Self {
        match err {
            ConsumptionError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            ConsumptionError::InsufficientStock(_) => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            ConsumptionError::Db(db) => db.into(),
        }
    }
}

impl From<bistro_core::ValidationError> for ApiError {
    fn from(err: bistro_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_db::Shortfall;

    #[test]
    fn test_shortfall_maps_to_400_with_full_detail() {
        let err = ConsumptionError::InsufficientStock(vec![
            Shortfall {
                stock_item_id: "s1".to_string(),
                name: "Burger Bun".to_string(),
                needed: 2,
                available: 1,
            },
            Shortfall {
                stock_item_id: "s2".to_string(),
                name: "Cheddar Slice".to_string(),
                needed: 4,
                available: 0,
            },
        ]);

        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::InsufficientStock);
        assert_eq!(api.code.status(), StatusCode::BAD_REQUEST);
        assert!(api.message.contains("Burger Bun (needed 2, have 1)"));
        assert!(api.message.contains("Cheddar Slice (needed 4, have 0)"));
    }

    #[test]
    fn test_invalid_state_maps_to_conflict() {
        let api: ApiError = DbError::invalid_state("order #1 is in_progress, expected pending")
            .into();
        assert_eq!(api.code, ErrorCode::Conflict);
        assert_eq!(api.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_engine_not_found_maps_to_404() {
        let api: ApiError = ConsumptionError::OrderNotFound("abc".to_string()).into();
        assert_eq!(api.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_validation_error_maps_to_400() {
        let api: ApiError = bistro_core::ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.code.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "quantity must be positive");
    }
}
