//! # User Repository
//!
//! Database operations for staff accounts.
//!
//! ## Notes
//! - `password_hash` stores an argon2 PHC string; hashing and verification
//!   happen in the server app, this layer only persists the string.
//! - Accounts are soft-deleted (`is_active = 0`) so historical orders and
//!   payments keep a valid `opened_by` / `received_by` reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::User;

/// All user columns, in schema order. Shared by every SELECT so the
/// FromRow mapping stays in one place.
const USER_COLUMNS: &str = "id, username, display_name, password_hash, role, \
                            is_active, created_at, updated_at";

/// Repository for staff account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already exists
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(username = %user.username, role = %user.role, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, username, display_name, password_hash, role, \
                                is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets an active user by username (the login lookup).
    ///
    /// Deactivated accounts are invisible here so their credentials
    /// stop working the moment they are disabled.
    pub async fn get_active_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 AND is_active = 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all users, active first, then by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY is_active DESC, username"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Updates an existing user (all mutable fields).
    pub async fn update(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Updating user");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET \
                username = ?2, \
                display_name = ?3, \
                password_hash = ?4, \
                role = ?5, \
                is_active = ?6, \
                updated_at = ?7 \
             WHERE id = ?1",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }

        Ok(())
    }

    /// Soft-deletes a user by setting is_active = false.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting user");

        let now = Utc::now();

        let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Counts active users.
    ///
    /// Used at startup to decide whether the bootstrap admin account
    /// needs to be created.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use bistro_core::UserRole;

    fn test_user(username: &str, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: generate_id(),
            username: username.to_string(),
            display_name: username.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = test_user("maria.r", UserRole::Manager);
        repo.insert(&user).await.unwrap();

        let found = repo.get_active_by_username("maria.r").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, UserRole::Manager);

        assert_eq!(repo.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&test_user("sam", UserRole::Waiter)).await.unwrap();
        let err = repo.insert(&test_user("sam", UserRole::Kitchen)).await;

        assert!(matches!(err, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_login() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = test_user("temp", UserRole::Cashier);
        repo.insert(&user).await.unwrap();
        repo.soft_delete(&user.id).await.unwrap();

        // Login lookup no longer sees the account, but the row survives
        assert!(repo.get_active_by_username("temp").await.unwrap().is_none());
        let row = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert!(!row.is_active);
    }
}
