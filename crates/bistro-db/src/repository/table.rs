//! # Dining Table Repository
//!
//! Database operations for the floor plan's dining tables.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::DiningTable;

const TABLE_COLUMNS: &str = "id, name, zone, seats, is_active, created_at, updated_at";

/// Repository for dining table operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Inserts a new dining table.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - table name already exists
    pub async fn insert(&self, table: &DiningTable) -> DbResult<()> {
        debug!(name = %table.name, "Inserting dining table");

        sqlx::query(
            "INSERT INTO dining_tables (id, name, zone, seats, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&table.id)
        .bind(&table.name)
        .bind(&table.zone)
        .bind(table.seats)
        .bind(table.is_active)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    /// Lists active tables ordered by zone, then name.
    pub async fn list_active(&self) -> DbResult<Vec<DiningTable>> {
        let tables = sqlx::query_as::<_, DiningTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE is_active = 1 ORDER BY zone, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Updates a table's mutable fields.
    pub async fn update(&self, table: &DiningTable) -> DbResult<()> {
        debug!(id = %table.id, "Updating dining table");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE dining_tables SET \
                name = ?2, zone = ?3, seats = ?4, is_active = ?5, updated_at = ?6 \
             WHERE id = ?1",
        )
        .bind(&table.id)
        .bind(&table.name)
        .bind(&table.zone)
        .bind(table.seats)
        .bind(table.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", &table.id));
        }

        Ok(())
    }

    /// Soft-deletes a table.
    ///
    /// Historical orders keep their table reference; the table just
    /// disappears from the floor plan.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting dining table");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE dining_tables SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        Ok(())
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

    fn test_table(name: &str, zone: Option<&str>) -> DiningTable {
        let now = Utc::now();
        DiningTable {
            id: generate_id(),
            name: name.to_string(),
            zone: zone.map(str::to_string),
            seats: 4,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_list_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tables();

        let t1 = test_table("T1", Some("main"));
        let t2 = test_table("P1", Some("patio"));
        repo.insert(&t1).await.unwrap();
        repo.insert(&t2).await.unwrap();

        assert_eq!(repo.list_active().await.unwrap().len(), 2);

        repo.soft_delete(&t2.id).await.unwrap();
        let remaining = repo.list_active().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "T1");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tables();

        repo.insert(&test_table("T1", None)).await.unwrap();
        let err = repo.insert(&test_table("T1", None)).await;
        assert!(matches!(err, Err(DbError::UniqueViolation { .. })));
    }
}
