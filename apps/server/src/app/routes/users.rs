//! Staff account administration (admin-only).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::app::dto;
use crate::auth::hash_password;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use bistro_core::validation::{validate_name, validate_password, validate_username};
use bistro_core::User;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", axum::routing::put(update_user).delete(delete_user))
}

/// GET /users
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<dto::UserDto>>, ApiError> {
    current.require_user_admin()?;

    let users = state.db.users().list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// POST /users
pub async fn create_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<dto::CreateUserRequest>,
) -> Result<(StatusCode, Json<dto::UserDto>), ApiError> {
    current.require_user_admin()?;

    validate_username(&body.username)?;
    validate_name("displayName", &body.display_name)?;
    validate_password(&body.password)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: body.username.trim().to_string(),
        display_name: body.display_name.trim().to_string(),
        password_hash: hash_password(&body.password)?,
        role: body.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.users().insert(&user).await?;

    info!(username = %user.username, role = %user.role, "User account created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /users/:id
pub async fn update_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> Result<Json<dto::UserDto>, ApiError> {
    current.require_user_admin()?;

    validate_name("displayName", &body.display_name)?;

    let mut user = state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    user.display_name = body.display_name.trim().to_string();
    user.role = body.role;
    user.is_active = body.is_active;
    if let Some(password) = &body.password {
        validate_password(password)?;
        user.password_hash = hash_password(password)?;
    }
    state.db.users().update(&user).await?;

    Ok(Json(user.into()))
}

/// DELETE /users/:id (soft delete)
pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    current.require_user_admin()?;

    if current.user_id == id {
        return Err(ApiError::validation("cannot deactivate your own account"));
    }

    state.db.users().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
