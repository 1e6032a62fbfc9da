//! Bearer-auth middleware.
//!
//! Validates the `Authorization: Bearer <jwt>` header on every protected
//! route and injects a [`CurrentUser`] extension for handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{extract_bearer_token, JwtManager};
use crate::error::ApiError;
use bistro_core::UserRole;

/// State handed to the middleware layer.
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtManager>,
}

/// The authenticated caller, derived from the access token claims.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Fails with 403 unless the role may administer user accounts.
    pub fn require_user_admin(&self) -> Result<(), ApiError> {
        if self.role.can_manage_users() {
            Ok(())
        } else {
            Err(ApiError::forbidden("User administration requires admin role"))
        }
    }

    /// Fails with 403 unless the role may run the register close.
    pub fn require_register_close(&self) -> Result<(), ApiError> {
        if self.role.can_close_register() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Register close requires admin or manager role",
            ))
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token").into_response())?;

    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|e| e.into_response())?;

    req.extensions_mut().insert(CurrentUser {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
}
