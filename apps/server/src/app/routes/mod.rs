//! HTTP routes, one file per domain area.

use axum::{routing::get, Router};

pub mod auth;
pub mod kitchen;
pub mod menu;
pub mod orders;
pub mod reports;
pub mod stock;
pub mod system;
pub mod tables;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/menu", menu::router())
        .nest("/tables", tables::router())
        .nest("/stock", stock::router())
        .nest("/orders", orders::router())
        .nest("/kitchen", kitchen::router())
        .nest("/users", users::router())
        .nest("/reports", reports::router())
}
