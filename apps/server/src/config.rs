//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Bistro server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Username for the bootstrap admin account, created on first start
    /// when the user table is empty
    pub bootstrap_admin_username: String,

    /// Password for the bootstrap admin account
    pub bootstrap_admin_password: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            port: env::var("BISTRO_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BISTRO_PORT".to_string()))?,

            database_path: env::var("BISTRO_DB_PATH").unwrap_or_else(|_| "./bistro.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback only.
                // In production, this MUST be set via environment variable
                "bistro-dev-secret-change-in-production".to_string()
            }),

            jwt_access_lifetime_secs: env::var("JWT_ACCESS_LIFETIME_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?,

            jwt_refresh_lifetime_secs: env::var("JWT_REFRESH_LIFETIME_SECS")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()))?,

            bootstrap_admin_username: env::var("BISTRO_ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),

            bootstrap_admin_password: env::var("BISTRO_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "bistro123".to_string()),
        };

        if config.bootstrap_admin_password.len() < 8 {
            return Err(ConfigError::InvalidValue(
                "BISTRO_ADMIN_PASSWORD (must be at least 8 characters)".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // No env vars set in the test environment for these keys
        let config = ServerConfig::load().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_access_lifetime_secs, 3600);
        assert_eq!(config.bootstrap_admin_username, "admin");
    }
}
