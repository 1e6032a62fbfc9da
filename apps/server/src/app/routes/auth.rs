//! Login, token refresh, and caller identity.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use tracing::{info, warn};

use crate::app::dto;
use crate::auth::verify_password;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// POST /auth/login
///
/// The username lookup only sees active accounts, so deactivating a
/// user kills their credentials immediately. Unknown username and
/// wrong password return the same message.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::LoginRequest>,
) -> Result<Json<dto::LoginResponse>, ApiError> {
    let user = state
        .db
        .users()
        .get_active_by_username(body.username.trim())
        .await?;

    let user = match user {
        Some(u) if verify_password(&body.password, &u.password_hash) => u,
        _ => {
            warn!(username = %body.username, "Failed login attempt");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    let tokens = state.jwt.generate_pair(&user.id, &user.username, user.role)?;

    info!(username = %user.username, role = %user.role, "User logged in");

    Ok(Json(dto::LoginResponse {
        user: user.into(),
        tokens,
    }))
}

/// POST /auth/refresh
///
/// Re-checks the account against the database: a token minted before a
/// deactivation must not refresh into a new pair.
pub async fn refresh(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::RefreshRequest>,
) -> Result<Json<dto::LoginResponse>, ApiError> {
    let claims = state.jwt.validate_refresh_token(&body.refresh_token)?;

    let user = state
        .db
        .users()
        .get_by_id(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Account no longer active"))?;

    let tokens = state.jwt.generate_pair(&user.id, &user.username, user.role)?;

    Ok(Json(dto::LoginResponse {
        user: user.into(),
        tokens,
    }))
}

/// GET /auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<dto::MeResponse> {
    Json(dto::MeResponse {
        user_id: current.user_id,
        username: current.username,
        role: current.role,
    })
}
