//! Shared application state.

use std::sync::Arc;

use tracing::info;

use crate::auth::{hash_password, JwtManager};
use crate::config::ServerConfig;
use crate::error::ApiError;
use bistro_core::{User, UserRole};
use bistro_db::Database;

/// Shared application state, `Extension`-injected into every handler.
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        ));
        AppState { db, jwt, config }
    }
}

/// Creates the bootstrap admin account if no active user exists.
///
/// Runs on every startup; a fresh database gets exactly one admin so
/// the venue can log in and create real staff accounts.
pub async fn ensure_bootstrap_admin(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<(), ApiError> {
    if db.users().count_active().await? > 0 {
        return Ok(());
    }

    let now = chrono::Utc::now();
    db.users()
        .insert(&User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: "Administrator".to_string(),
            password_hash: hash_password(password)?,
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    info!(username = %username, "Bootstrap admin account created");
    Ok(())
}
