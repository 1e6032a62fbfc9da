//! # Inventory Consumption Engine
//!
//! Deducts recipe ingredients from stock when an order is sent to the
//! kitchen. This is the one place where selling food changes inventory.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 consume_order(order_id)  —  ONE transaction             │
//! │                                                                         │
//! │  1. Load the order (its number tags the movement rows)                 │
//! │                                                                         │
//! │  2. Join lines × recipe entries × stock items. Lines whose menu        │
//! │     item has NO recipe entries drop out here: fountain sodas and       │
//! │     such simply don't touch inventory.                                 │
//! │                                                                         │
//! │  3. Accumulate demand per ingredient:                                  │
//! │        needed[item] += ceil(qty_per_unit_milli × line_qty / 1000)      │
//! │     The ceiling is per LINE: 0.25 lb × 3 burgers on one line is       │
//! │     ceil(0.75) = 1 lb, not 3 × ceil(0.25) = 3 lb.                      │
//! │                                                                         │
//! │  4. Check EVERY ingredient before touching ANY. All shortfalls are     │
//! │     collected and reported together, so the kitchen learns about the   │
//! │     missing buns AND the missing cheese from one failed attempt.       │
//! │                                                                         │
//! │  5. Deduct with guarded UPDATEs:                                       │
//! │        SET on_hand_qty = on_hand_qty - ?                               │
//! │        WHERE id = ? AND on_hand_qty >= ?                               │
//! │     A concurrent order that drained the shelf between step 4 and       │
//! │     here makes the UPDATE match zero rows; we re-read and fail         │
//! │     cleanly instead of committing a negative balance. The schema's     │
//! │     CHECK (on_hand_qty >= 0) is the storage-level backstop.            │
//! │                                                                         │
//! │  6. One movement row per ingredient (NOT per line), reason             │
//! │     "Order #<order_number>".                                           │
//! │                                                                         │
//! │  Any failure before COMMIT rolls the whole thing back: stock is        │
//! │  never partially deducted.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## NOT Idempotent
//! Calling `consume_order` twice deducts twice. The engine does not look
//! at order status; the call site must win the guarded
//! `pending → in_progress` transition BEFORE invoking it, so of two
//! concurrent starts only one ever reaches the engine (the claim is
//! handed back via `revert_to_pending` when consumption is refused).

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::repository::generate_id;
use crate::repository::stock::insert_movement;
use bistro_core::{MovementKind, RecipeQty, StockMovement};

// =============================================================================
// Types
// =============================================================================

/// One ingredient the stock could not cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortfall {
    pub stock_item_id: String,
    pub name: String,
    /// Whole units required for the order.
    pub needed: i64,
    /// Whole units on hand at check time.
    pub available: i64,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient stock: {} (needed {}, have {})",
            self.name, self.needed, self.available
        )
    }
}

/// One committed deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deduction {
    pub stock_item_id: String,
    pub name: String,
    /// Whole units deducted.
    pub quantity: i64,
}

/// What a successful consumption run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionReport {
    pub order_id: String,
    pub order_number: i64,
    /// One entry per distinct ingredient, ordered by ingredient name.
    /// Empty when no line had a recipe.
    pub deductions: Vec<Deduction>,
}

/// Consumption engine errors.
#[derive(Debug, Error)]
pub enum ConsumptionError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// At least one ingredient cannot be covered. Carries EVERY
    /// shortfall found, not just the first.
    #[error("{}", format_shortfalls(.0))]
    InsufficientStock(Vec<Shortfall>),

    #[error(transparent)]
    Db(#[from] DbError),
}

fn format_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(Shortfall::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<sqlx::Error> for ConsumptionError {
    fn from(err: sqlx::Error) -> Self {
        ConsumptionError::Db(DbError::from(err))
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Per-ingredient demand accumulated over an order's lines.
#[derive(Debug)]
struct Demand {
    stock_item_id: String,
    unit_cost_cents: i64,
    on_hand_qty: i64,
    needed: i64,
}

/// The inventory consumption engine.
#[derive(Debug, Clone)]
pub struct ConsumptionEngine {
    pool: SqlitePool,
}

impl ConsumptionEngine {
    /// Creates a new ConsumptionEngine.
    pub fn new(pool: SqlitePool) -> Self {
        ConsumptionEngine { pool }
    }

    /// Deducts the order's recipe ingredients from stock, atomically.
    ///
    /// See the module docs for the full algorithm. Status is NOT
    /// checked here; the caller's guarded transition is the trigger.
    pub async fn consume_order(&self, order_id: &str) -> Result<ConsumptionReport, ConsumptionError> {
        let mut tx = self.pool.begin().await?;

        let order: Option<(String, i64)> =
            sqlx::query_as("SELECT id, order_number FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (order_id, order_number) =
            order.ok_or_else(|| ConsumptionError::OrderNotFound(order_id.to_string()))?;

        // Inner joins drop lines whose menu item has no recipe.
        let rows: Vec<(String, String, i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT r.stock_item_id, s.name, s.on_hand_qty, s.unit_cost_cents, \
                    r.qty_per_unit_milli, l.quantity \
             FROM order_lines l \
             JOIN recipe_entries r ON r.menu_item_id = l.menu_item_id \
             JOIN stock_items s ON s.id = r.stock_item_id \
             WHERE l.order_id = ?1",
        )
        .bind(&order_id)
        .fetch_all(&mut *tx)
        .await?;

        // BTreeMap keyed by ingredient name keeps deductions, shortfall
        // lists and movement insertion order deterministic.
        let mut demands: BTreeMap<String, Demand> = BTreeMap::new();
        for (stock_item_id, name, on_hand_qty, unit_cost_cents, qty_per_unit_milli, line_qty) in
            rows
        {
            let required = RecipeQty::from_milli(qty_per_unit_milli).required_for(line_qty);
            demands
                .entry(name)
                .or_insert(Demand {
                    stock_item_id,
                    unit_cost_cents,
                    on_hand_qty,
                    needed: 0,
                })
                .needed += required;
        }

        // Collect every shortfall before touching anything.
        let shortfalls: Vec<Shortfall> = demands
            .iter()
            .filter(|(_, d)| d.needed > d.on_hand_qty)
            .map(|(name, d)| Shortfall {
                stock_item_id: d.stock_item_id.clone(),
                name: name.clone(),
                needed: d.needed,
                available: d.on_hand_qty,
            })
            .collect();
        if !shortfalls.is_empty() {
            warn!(
                order_number = order_number,
                shortfalls = shortfalls.len(),
                "Consumption refused, stock short"
            );
            return Err(ConsumptionError::InsufficientStock(shortfalls));
        }

        let now = Utc::now();
        let reason = format!("Order #{}", order_number);
        let mut deductions = Vec::with_capacity(demands.len());

        for (name, demand) in &demands {
            let stock_item_id = &demand.stock_item_id;

            // Guarded deduction: loses cleanly to a concurrent writer.
            let result = sqlx::query(
                "UPDATE stock_items \
                 SET on_hand_qty = on_hand_qty - ?2, updated_at = ?3 \
                 WHERE id = ?1 AND on_hand_qty >= ?2",
            )
            .bind(stock_item_id)
            .bind(demand.needed)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: i64 =
                    sqlx::query_scalar("SELECT on_hand_qty FROM stock_items WHERE id = ?1")
                        .bind(stock_item_id)
                        .fetch_one(&mut *tx)
                        .await?;
                warn!(
                    order_number = order_number,
                    ingredient = %name,
                    "Consumption lost race, rolling back"
                );
                return Err(ConsumptionError::InsufficientStock(vec![Shortfall {
                    stock_item_id: stock_item_id.clone(),
                    name: name.clone(),
                    needed: demand.needed,
                    available,
                }]));
            }

            insert_movement(
                &mut tx,
                &StockMovement {
                    id: generate_id(),
                    stock_item_id: stock_item_id.clone(),
                    quantity_delta: -demand.needed,
                    kind: MovementKind::Consumption,
                    unit_cost_cents: demand.unit_cost_cents,
                    reason: reason.clone(),
                    created_at: now,
                },
            )
            .await?;

            debug!(
                order_number = order_number,
                ingredient = %name,
                deducted = demand.needed,
                "Ingredient deducted"
            );

            deductions.push(Deduction {
                stock_item_id: stock_item_id.clone(),
                name: name.clone(),
                quantity: demand.needed,
            });
        }

        tx.commit().await?;

        info!(
            order_number = order_number,
            ingredients = deductions.len(),
            "Order consumed"
        );

        Ok(ConsumptionReport {
            order_id,
            order_number,
            deductions,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::menu::tests::insert_menu_item;
    use crate::repository::order::tests::{insert_user, line};
    use crate::repository::stock::tests::insert_stock_item;
    use bistro_core::UserRole;

    /// Stock: 10 lb beef, `buns` pcs of buns. Burger recipe: 0.25 lb
    /// beef + 1 bun each. Returns (order_id, beef_id, bun_id) with a
    /// pending order for 2 burgers (order #1).
    async fn burger_scenario(db: &Database, buns: i64) -> (String, String, String) {
        let waiter = insert_user(db, "sam", UserRole::Waiter).await;
        let beef = insert_stock_item(db, "Ground Beef", "lb", 10, 450).await;
        let bun = insert_stock_item(db, "Burger Bun", "pcs", buns, 35).await;

        let burger = insert_menu_item(db, "Classic Burger", 1099).await;
        db.menu()
            .replace_recipe(&burger.id, &[(beef.id.clone(), 250), (bun.id.clone(), 1000)])
            .await
            .unwrap();

        let order = db
            .orders()
            .create(None, 2, &waiter.id, None, &[line(&burger.id, 2)])
            .await
            .unwrap();
        assert_eq!(order.order_number, 1);

        (order.id, beef.id, bun.id)
    }

    async fn on_hand(db: &Database, id: &str) -> i64 {
        db.stock().get_by_id(id).await.unwrap().unwrap().on_hand_qty
    }

    #[tokio::test]
    async fn test_shortfall_rolls_back_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // Only 1 bun on the shelf; 2 burgers need 2.
        let (order_id, beef_id, bun_id) = burger_scenario(&db, 1).await;

        let err = db.consumption().consume_order(&order_id).await;
        match err {
            Err(ConsumptionError::InsufficientStock(shortfalls)) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].name, "Burger Bun");
                assert_eq!(shortfalls[0].needed, 2);
                assert_eq!(shortfalls[0].available, 1);
                assert_eq!(
                    shortfalls[0].to_string(),
                    "insufficient stock: Burger Bun (needed 2, have 1)"
                );
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        // Beef was coverable (ceil(2 × 0.25) = 1 ≤ 10) but must be
        // untouched: all-or-nothing.
        assert_eq!(on_hand(&db, &beef_id).await, 10);
        assert_eq!(on_hand(&db, &bun_id).await, 1);
        assert!(db.stock().movements(&beef_id, 10).await.unwrap().is_empty());
        assert!(db.stock().movements(&bun_id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restock_then_success() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (order_id, beef_id, bun_id) = burger_scenario(&db, 1).await;

        assert!(db.consumption().consume_order(&order_id).await.is_err());

        // Restock buns to 5 and retry
        db.stock().receive(&bun_id, 4, None).await.unwrap();
        let report = db.consumption().consume_order(&order_id).await.unwrap();

        assert_eq!(report.order_number, 1);
        assert_eq!(report.deductions.len(), 2);
        // BTreeMap ordering: "Burger Bun" before "Ground Beef"
        assert_eq!(report.deductions[0].name, "Burger Bun");
        assert_eq!(report.deductions[0].quantity, 2);
        assert_eq!(report.deductions[1].name, "Ground Beef");
        assert_eq!(report.deductions[1].quantity, 1);

        assert_eq!(on_hand(&db, &beef_id).await, 9);
        assert_eq!(on_hand(&db, &bun_id).await, 3);

        // One consumption movement per ingredient, tagged with the
        // order number
        let beef_moves = db.stock().movements(&beef_id, 10).await.unwrap();
        assert_eq!(beef_moves.len(), 1);
        assert_eq!(beef_moves[0].kind, MovementKind::Consumption);
        assert_eq!(beef_moves[0].quantity_delta, -1);
        assert_eq!(beef_moves[0].reason, "Order #1");

        let bun_moves = db.stock().movements(&bun_id, 10).await.unwrap();
        // receive + consumption, newest first
        assert_eq!(bun_moves.len(), 2);
        assert_eq!(bun_moves[0].kind, MovementKind::Consumption);
        assert_eq!(bun_moves[0].quantity_delta, -2);
        assert_eq!(bun_moves[0].reason, "Order #1");
    }

    #[tokio::test]
    async fn test_per_line_ceiling() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let cheese = insert_stock_item(&db, "Cheese", "lb", 10, 300).await;

        // 0.25 lb per sandwich; one line of 3 needs ceil(0.75) = 1 lb,
        // not 3 × ceil(0.25) = 3 lb
        let sandwich = insert_menu_item(&db, "Grilled Cheese", 699).await;
        db.menu()
            .replace_recipe(&sandwich.id, &[(cheese.id.clone(), 250)])
            .await
            .unwrap();

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&sandwich.id, 3)])
            .await
            .unwrap();
        let report = db.consumption().consume_order(&order.id).await.unwrap();

        assert_eq!(report.deductions[0].quantity, 1);
        assert_eq!(on_hand(&db, &cheese.id).await, 9);
    }

    #[tokio::test]
    async fn test_shared_ingredient_accumulates_across_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let bun = insert_stock_item(&db, "Burger Bun", "pcs", 10, 35).await;

        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;
        let slider = insert_menu_item(&db, "Slider Trio", 899).await;
        db.menu()
            .replace_recipe(&burger.id, &[(bun.id.clone(), 1000)])
            .await
            .unwrap();
        // 3 mini buns per trio, modeled as 3000 milli of the same SKU
        db.menu()
            .replace_recipe(&slider.id, &[(bun.id.clone(), 3000)])
            .await
            .unwrap();

        let order = db
            .orders()
            .create(
                None,
                1,
                &waiter.id,
                None,
                &[line(&burger.id, 2), line(&slider.id, 1)],
            )
            .await
            .unwrap();
        let report = db.consumption().consume_order(&order.id).await.unwrap();

        // 2 + 3 = 5 buns, one deduction entry, one movement row
        assert_eq!(report.deductions.len(), 1);
        assert_eq!(report.deductions[0].quantity, 5);
        assert_eq!(on_hand(&db, &bun.id).await, 5);
        assert_eq!(db.stock().movements(&bun.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recipeless_lines_are_skipped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let soda = insert_menu_item(&db, "Fountain Soda", 249).await;

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&soda.id, 4)])
            .await
            .unwrap();
        let report = db.consumption().consume_order(&order.id).await.unwrap();

        assert!(report.deductions.is_empty());
    }

    #[tokio::test]
    async fn test_engine_is_not_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (order_id, beef_id, bun_id) = burger_scenario(&db, 10).await;

        db.consumption().consume_order(&order_id).await.unwrap();
        // A second call deducts AGAIN; the status machine at the call
        // site is the only thing preventing this in production.
        db.consumption().consume_order(&order_id).await.unwrap();

        assert_eq!(on_hand(&db, &beef_id).await, 8);
        assert_eq!(on_hand(&db, &bun_id).await, 6);
        assert_eq!(db.stock().movements(&bun_id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.consumption().consume_order("missing").await;
        assert!(matches!(err, Err(ConsumptionError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_multiple_shortfalls_reported_together() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let beef = insert_stock_item(&db, "Ground Beef", "lb", 0, 450).await;
        let bun = insert_stock_item(&db, "Burger Bun", "pcs", 0, 35).await;

        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;
        db.menu()
            .replace_recipe(&burger.id, &[(beef.id.clone(), 250), (bun.id.clone(), 1000)])
            .await
            .unwrap();

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();

        match db.consumption().consume_order(&order.id).await {
            Err(ConsumptionError::InsufficientStock(shortfalls)) => {
                assert_eq!(shortfalls.len(), 2);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }
}
