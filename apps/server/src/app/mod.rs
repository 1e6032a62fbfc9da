//! # HTTP Application
//!
//! Router assembly for the REST API.
//!
//! ## Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Route Map                                       │
//! │                                                                         │
//! │  Public (no token)                                                      │
//! │    GET  /health                liveness + migration status              │
//! │    POST /auth/login            credentials → access/refresh pair        │
//! │    POST /auth/refresh          refresh token → new pair                 │
//! │                                                                         │
//! │  Protected (Bearer access token)                                        │
//! │    GET  /auth/me               caller identity                          │
//! │    /menu /tables /stock        catalog management                       │
//! │    /orders /kitchen            order lifecycle + consumption trigger    │
//! │    /users /reports             admin & end-of-day                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::{auth_middleware, AuthState};
use crate::state::AppState;

pub mod dto;
pub mod routes;

/// Builds the full application router.
pub fn build_app(state: Arc<AppState>) -> Router {
    let protected = routes::router().layer(from_fn_with_state(
        AuthState {
            jwt: state.jwt.clone(),
        },
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .merge(protected)
        .layer(Extension(state))
}
