//! # Stock Repository
//!
//! Database operations for stock items and the movement audit trail.
//!
//! ## The Movement Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Every quantity change leaves exactly one footprint           │
//! │                                                                         │
//! │  stock_items.on_hand_qty is NEVER written directly. The only writers:  │
//! │                                                                         │
//! │    receive()          +qty   movement kind 'received'                  │
//! │    adjust()           ±qty   movement kind 'adjustment' / 'waste'      │
//! │    ConsumptionEngine  -qty   movement kind 'consumption'               │
//! │                                                                         │
//! │  Each pairs the UPDATE with an INSERT into stock_movements in the      │
//! │  same transaction. Quantity history is therefore always replayable     │
//! │  from the movement trail.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarded Deductions
//! Negative deltas use `WHERE on_hand_qty + delta >= 0` so a concurrent
//! writer can never drive the committed quantity negative; the schema's
//! CHECK constraint is the storage-level backstop.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use bistro_core::{MovementKind, StockItem, StockMovement};

const STOCK_COLUMNS: &str = "id, name, unit, on_hand_qty, unit_cost_cents, reorder_level, \
                             is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str =
    "id, stock_item_id, quantity_delta, kind, unit_cost_cents, reason, created_at";

/// Repository for stock item and movement operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Stock items
    // -------------------------------------------------------------------------

    /// Inserts a new stock item.
    pub async fn insert(&self, item: &StockItem) -> DbResult<()> {
        debug!(name = %item.name, "Inserting stock item");

        sqlx::query(
            "INSERT INTO stock_items (id, name, unit, on_hand_qty, unit_cost_cents, \
                                      reorder_level, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.on_hand_qty)
        .bind(item.unit_cost_cents)
        .bind(item.reorder_level)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a stock item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active stock items ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Updates a stock item's descriptive fields.
    ///
    /// Deliberately does NOT touch `on_hand_qty`: quantity changes go
    /// through the movement-producing operations below.
    pub async fn update(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating stock item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE stock_items SET \
                name = ?2, unit = ?3, unit_cost_cents = ?4, reorder_level = ?5, \
                is_active = ?6, updated_at = ?7 \
             WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.unit_cost_cents)
        .bind(item.reorder_level)
        .bind(item.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", &item.id));
        }

        Ok(())
    }

    /// Lists active items at or below their reorder threshold.
    pub async fn low_stock(&self) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items \
             WHERE is_active = 1 AND reorder_level IS NOT NULL \
               AND on_hand_qty <= reorder_level \
             ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // -------------------------------------------------------------------------
    // Movement-producing operations
    // -------------------------------------------------------------------------

    /// Receives goods: increases on-hand quantity, optionally updates the
    /// unit cost to the latest purchase price, and appends one 'received'
    /// movement - all in one transaction.
    pub async fn receive(
        &self,
        id: &str,
        quantity: i64,
        unit_cost_cents: Option<i64>,
    ) -> DbResult<StockMovement> {
        debug!(id = %id, quantity = %quantity, "Receiving stock");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = match unit_cost_cents {
            Some(cost) => {
                sqlx::query(
                    "UPDATE stock_items SET \
                        on_hand_qty = on_hand_qty + ?2, unit_cost_cents = ?3, updated_at = ?4 \
                     WHERE id = ?1",
                )
                .bind(id)
                .bind(quantity)
                .bind(cost)
                .bind(now)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE stock_items SET on_hand_qty = on_hand_qty + ?2, updated_at = ?3 \
                     WHERE id = ?1",
                )
                .bind(id)
                .bind(quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        // Snapshot the cost AFTER the update so the movement carries the
        // price the goods actually came in at.
        let cost: i64 = sqlx::query_scalar("SELECT unit_cost_cents FROM stock_items WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let movement = StockMovement {
            id: generate_id(),
            stock_item_id: id.to_string(),
            quantity_delta: quantity,
            kind: MovementKind::Received,
            unit_cost_cents: cost,
            reason: "Goods received".to_string(),
            created_at: now,
        };
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Applies a manual signed correction with one 'adjustment' (or
    /// 'waste') movement, in one transaction.
    ///
    /// ## Guarantees
    /// A negative delta that would overdraw the item fails with
    /// `DbError::CheckViolation`; the quantity is untouched and no
    /// movement is written.
    pub async fn adjust(
        &self,
        id: &str,
        delta: i64,
        kind: MovementKind,
        reason: &str,
    ) -> DbResult<StockMovement> {
        debug!(id = %id, delta = %delta, kind = ?kind, "Adjusting stock");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Guarded update: refuses to take the quantity below zero.
        let result = sqlx::query(
            "UPDATE stock_items SET on_hand_qty = on_hand_qty + ?2, updated_at = ?3 \
             WHERE id = ?1 AND on_hand_qty + ?2 >= 0",
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish missing item from an overdraw.
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(DbError::not_found("Stock item", id));
            }
            return Err(DbError::CheckViolation {
                message: format!("adjustment of {} would overdraw stock item {}", delta, id),
            });
        }

        let cost: i64 = sqlx::query_scalar("SELECT unit_cost_cents FROM stock_items WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let movement = StockMovement {
            id: generate_id(),
            stock_item_id: id.to_string(),
            quantity_delta: delta,
            kind,
            unit_cost_cents: cost,
            reason: reason.to_string(),
            created_at: now,
        };
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Lists movements for a stock item, newest first.
    pub async fn movements(&self, stock_item_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE stock_item_id = ?1 ORDER BY created_at DESC, id LIMIT ?2"
        ))
        .bind(stock_item_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Appends one movement row inside the caller's transaction.
///
/// Shared with the consumption engine, which writes its 'consumption'
/// movements through the same statement.
pub(crate) async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO stock_movements (id, stock_item_id, quantity_delta, kind, \
                                      unit_cost_cents, reason, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&movement.id)
    .bind(&movement.stock_item_id)
    .bind(movement.quantity_delta)
    .bind(movement.kind)
    .bind(movement.unit_cost_cents)
    .bind(&movement.reason)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    pub(crate) async fn insert_stock_item(
        db: &Database,
        name: &str,
        unit: &str,
        on_hand_qty: i64,
        unit_cost_cents: i64,
    ) -> StockItem {
        let now = Utc::now();
        let item = StockItem {
            id: generate_id(),
            name: name.to_string(),
            unit: unit.to_string(),
            on_hand_qty,
            unit_cost_cents,
            reorder_level: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.stock().insert(&item).await.unwrap();
        item
    }

    #[tokio::test]
    async fn test_receive_creates_movement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = insert_stock_item(&db, "Burger Bun", "pcs", 10, 35).await;

        let movement = db.stock().receive(&item.id, 24, Some(40)).await.unwrap();
        assert_eq!(movement.quantity_delta, 24);
        assert_eq!(movement.kind, MovementKind::Received);
        assert_eq!(movement.unit_cost_cents, 40);

        let fresh = db.stock().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fresh.on_hand_qty, 34);
        assert_eq!(fresh.unit_cost_cents, 40);

        let trail = db.stock().movements(&item.id, 10).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].id, movement.id);
    }

    #[tokio::test]
    async fn test_adjust_down_and_waste() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = insert_stock_item(&db, "Ground Beef", "lb", 10, 450).await;

        db.stock()
            .adjust(&item.id, -2, MovementKind::Waste, "Spoiled batch")
            .await
            .unwrap();

        let fresh = db.stock().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fresh.on_hand_qty, 8);

        let trail = db.stock().movements(&item.id, 10).await.unwrap();
        assert_eq!(trail[0].kind, MovementKind::Waste);
        assert_eq!(trail[0].quantity_delta, -2);
    }

    #[tokio::test]
    async fn test_adjust_cannot_overdraw() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = insert_stock_item(&db, "Lemons", "pcs", 3, 25).await;

        let err = db
            .stock()
            .adjust(&item.id, -5, MovementKind::Adjustment, "Count fix")
            .await;
        assert!(matches!(err, Err(DbError::CheckViolation { .. })));

        // Quantity untouched, no movement recorded
        let fresh = db.stock().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fresh.on_hand_qty, 3);
        assert!(db.stock().movements(&item.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let now = Utc::now();
        let low = StockItem {
            id: generate_id(),
            name: "Burger Bun".to_string(),
            unit: "pcs".to_string(),
            on_hand_qty: 4,
            unit_cost_cents: 35,
            reorder_level: Some(5),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.stock().insert(&low).await.unwrap();

        // No threshold: never reported
        insert_stock_item(&db, "Salt", "kg", 1, 100).await;

        let report = db.stock().low_stock().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].name, "Burger Bun");
    }
}
