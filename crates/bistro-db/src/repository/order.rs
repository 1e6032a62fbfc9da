//! # Order Repository
//!
//! Database operations for orders, order lines, payments and the order
//! status machine.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Lifecycle & Stock                              │
//! │                                                                         │
//! │  create()              pending      lines snapshotted, totals frozen   │
//! │     │                                                                   │
//! │     ▼  "start": win this edge FIRST, then the engine deducts           │
//! │  set_status()          in_progress  stock deducted, movements written  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  set_status()          ready → served                                  │
//! │     │                                                                   │
//! │     ▼  add_payment() until total_paid ≥ total_cents                    │
//! │  close()               closed       closed_at stamped (terminal)       │
//! │                                                                         │
//! │  cancel is legal from pending / in_progress / ready                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarded Transitions
//! `set_status` updates with `WHERE id = ? AND status = ?`. Two cashiers
//! racing on the same ticket means one UPDATE matches zero rows and
//! surfaces `DbError::InvalidState` instead of silently re-running a
//! transition. This is what makes the `pending → in_progress` edge a
//! safe single trigger for the consumption engine.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use bistro_core::{
    Money, Order, OrderLine, OrderStatus, Payment, PaymentMethod, TaxRate, MAX_ORDER_LINES,
};

const ORDER_COLUMNS: &str = "id, order_number, table_id, guest_count, status, subtotal_cents, \
                             tax_cents, total_cents, opened_by, note, created_at, updated_at, \
                             closed_at";

const LINE_COLUMNS: &str = "id, order_id, menu_item_id, name_snapshot, unit_price_cents, \
                            tax_rate_bps, quantity, line_total_cents, note, created_at";

const PAYMENT_COLUMNS: &str =
    "id, order_id, method, amount_cents, tendered_cents, change_cents, received_by, created_at";

/// Input for one order line at creation time. The menu item's name,
/// price and tax rate are snapshotted from the current menu row.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub menu_item_id: String,
    pub quantity: i64,
    pub note: Option<String>,
}

/// Repository for order, line and payment operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates a pending order with its lines, in one transaction.
    ///
    /// ## Behavior
    /// - `order_number` is allocated as MAX + 1 inside the transaction
    /// - Each line snapshots the menu item's name, price and tax rate
    /// - Totals: per-line tax is rounded half-up, then summed - the same
    ///   cents a line-by-line receipt would show
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - a referenced menu item is missing or
    ///   inactive
    /// * `Err(DbError::InvalidState)` - no lines, or too many lines
    pub async fn create(
        &self,
        table_id: Option<&str>,
        guest_count: i64,
        opened_by: &str,
        note: Option<&str>,
        lines: &[NewOrderLine],
    ) -> DbResult<Order> {
        if lines.is_empty() {
            return Err(DbError::invalid_state("order must have at least one line"));
        }
        if lines.len() > MAX_ORDER_LINES {
            return Err(DbError::invalid_state(format!(
                "order exceeds {} lines",
                MAX_ORDER_LINES
            )));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Sequential business number; MAX+1 inside the tx keeps it
        // gap-free under SQLite's single-writer model.
        let order_number: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(order_number), 0) + 1 FROM orders")
                .fetch_one(&mut *tx)
                .await?;

        let order_id = generate_id();
        let mut subtotal = Money::zero();
        let mut tax = Money::zero();
        let mut order_lines = Vec::with_capacity(lines.len());

        for line in lines {
            let menu_item: Option<(String, i64, u32)> = sqlx::query_as(
                "SELECT name, price_cents, tax_rate_bps FROM menu_items \
                 WHERE id = ?1 AND is_active = 1",
            )
            .bind(&line.menu_item_id)
            .fetch_optional(&mut *tx)
            .await?;

            let (name, price_cents, tax_rate_bps) = menu_item
                .ok_or_else(|| DbError::not_found("Menu item", &line.menu_item_id))?;

            let line_total = Money::from_cents(price_cents) * line.quantity;
            let line_tax = line_total.calculate_tax(TaxRate::from_bps(tax_rate_bps));
            subtotal += line_total;
            tax += line_tax;

            order_lines.push(OrderLine {
                id: generate_id(),
                order_id: order_id.clone(),
                menu_item_id: line.menu_item_id.clone(),
                name_snapshot: name,
                unit_price_cents: price_cents,
                tax_rate_bps,
                quantity: line.quantity,
                line_total_cents: line_total.cents(),
                note: line.note.clone(),
                created_at: now,
            });
        }

        let order = Order {
            id: order_id,
            order_number,
            table_id: table_id.map(str::to_string),
            guest_count,
            status: OrderStatus::Pending,
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: (subtotal + tax).cents(),
            opened_by: opened_by.to_string(),
            note: note.map(str::to_string),
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        sqlx::query(
            "INSERT INTO orders (id, order_number, table_id, guest_count, status, \
                                 subtotal_cents, tax_cents, total_cents, opened_by, note, \
                                 created_at, updated_at, closed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&order.id)
        .bind(order.order_number)
        .bind(&order.table_id)
        .bind(order.guest_count)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(&order.opened_by)
        .bind(&order.note)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.closed_at)
        .execute(&mut *tx)
        .await?;

        for line in &order_lines {
            insert_line(&mut tx, line).await?;
        }

        tx.commit().await?;

        info!(
            order_number = order.order_number,
            lines = order_lines.len(),
            total_cents = order.total_cents,
            "Order created"
        );

        Ok(order)
    }

    /// Appends lines to a PENDING order and recomputes its totals, in
    /// one transaction. Once the kitchen has the ticket the lines are
    /// frozen (a new order is the way to add a forgotten dish).
    pub async fn add_lines(&self, order_id: &str, lines: &[NewOrderLine]) -> DbResult<Order> {
        if lines.is_empty() {
            return Err(DbError::invalid_state("no lines to add"));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(DbError::invalid_state(format!(
                "cannot add lines to a {} order",
                order.status
            )));
        }

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE order_id = ?1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if existing as usize + lines.len() > MAX_ORDER_LINES {
            return Err(DbError::invalid_state(format!(
                "order exceeds {} lines",
                MAX_ORDER_LINES
            )));
        }

        let mut subtotal = Money::from_cents(order.subtotal_cents);
        let mut tax = Money::from_cents(order.tax_cents);

        for line in lines {
            let menu_item: Option<(String, i64, u32)> = sqlx::query_as(
                "SELECT name, price_cents, tax_rate_bps FROM menu_items \
                 WHERE id = ?1 AND is_active = 1",
            )
            .bind(&line.menu_item_id)
            .fetch_optional(&mut *tx)
            .await?;

            let (name, price_cents, tax_rate_bps) = menu_item
                .ok_or_else(|| DbError::not_found("Menu item", &line.menu_item_id))?;

            let line_total = Money::from_cents(price_cents) * line.quantity;
            subtotal += line_total;
            tax += line_total.calculate_tax(TaxRate::from_bps(tax_rate_bps));

            insert_line(
                &mut tx,
                &OrderLine {
                    id: generate_id(),
                    order_id: order_id.to_string(),
                    menu_item_id: line.menu_item_id.clone(),
                    name_snapshot: name,
                    unit_price_cents: price_cents,
                    tax_rate_bps,
                    quantity: line.quantity,
                    line_total_cents: line_total.cents(),
                    note: line.note.clone(),
                    created_at: now,
                },
            )
            .await?;
        }

        let total = subtotal + tax;
        sqlx::query(
            "UPDATE orders SET subtotal_cents = ?2, tax_cents = ?3, total_cents = ?4, \
                               updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(order_id)
        .bind(subtotal.cents())
        .bind(tax.cents())
        .bind(total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists orders, optionally filtered by status, newest first.
    pub async fn list(&self, status: Option<OrderStatus>, limit: u32) -> DbResult<Vec<Order>> {
        let orders = match status {
            Some(status) => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1 \
                     ORDER BY order_number DESC LIMIT ?2"
                ))
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_number DESC LIMIT ?1"
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// The kitchen's work queue: pending and in-progress tickets,
    /// oldest first.
    pub async fn kitchen_queue(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status IN ('pending', 'in_progress') \
             ORDER BY order_number"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets the lines of an order in insertion order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // -------------------------------------------------------------------------
    // Status machine
    // -------------------------------------------------------------------------

    /// Moves an order from `from` to `to` with a guarded UPDATE.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such order
    /// * `Err(DbError::InvalidState)` - the transition is illegal, or
    ///   the order was not in `from` anymore (lost race)
    pub async fn set_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<Order> {
        if !from.can_transition(to) {
            return Err(DbError::invalid_state(format!(
                "cannot move order from {} to {}",
                from, to
            )));
        }

        debug!(id = %id, from = %from, to = %to, "Order status transition");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Zero rows: missing order, or someone moved it first.
            let current = self.get_by_id(id).await?;
            return match current {
                None => Err(DbError::not_found("Order", id)),
                Some(order) => Err(DbError::invalid_state(format!(
                    "order #{} is {}, expected {}",
                    order.order_number, order.status, from
                ))),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Returns a just-claimed order from `in_progress` back to `pending`.
    ///
    /// Compensation for the start endpoint: the ticket is claimed with
    /// the guarded `pending → in_progress` transition BEFORE the
    /// consumption engine runs, and handed back here when the engine
    /// refuses (shortfall) so a restock can retry it. Not part of the
    /// kitchen workflow; no other caller moves an order backwards.
    pub async fn revert_to_pending(&self, id: &str) -> DbResult<Order> {
        debug!(id = %id, "Reverting order claim");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 \
             WHERE id = ?1 AND status = 'in_progress'",
        )
        .bind(id)
        .bind(OrderStatus::Pending)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_by_id(id).await?;
            return match current {
                None => Err(DbError::not_found("Order", id)),
                Some(order) => Err(DbError::invalid_state(format!(
                    "order #{} is {}, expected in_progress",
                    order.order_number, order.status
                ))),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    // -------------------------------------------------------------------------
    // Payments & close
    // -------------------------------------------------------------------------

    /// Records a payment towards an order. Multiple payments are fine
    /// (split tender); overpaying cash is fine (change is returned).
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidState)` - order is cancelled or already
    ///   closed
    pub async fn add_payment(
        &self,
        order_id: &str,
        method: PaymentMethod,
        amount_cents: i64,
        tendered_cents: Option<i64>,
        received_by: &str,
    ) -> DbResult<Payment> {
        let order = self
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if order.status.is_terminal() {
            return Err(DbError::invalid_state(format!(
                "cannot record payment on a {} order",
                order.status
            )));
        }

        let change_cents = match (method, tendered_cents) {
            (PaymentMethod::Cash, Some(tendered)) if tendered > amount_cents => {
                Some(tendered - amount_cents)
            }
            (PaymentMethod::Cash, Some(_)) => Some(0),
            _ => None,
        };

        let payment = Payment {
            id: generate_id(),
            order_id: order_id.to_string(),
            method,
            amount_cents,
            tendered_cents,
            change_cents,
            received_by: received_by.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO payments (id, order_id, method, amount_cents, tendered_cents, \
                                   change_cents, received_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.tendered_cents)
        .bind(payment.change_cents)
        .bind(&payment.received_by)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            order_number = order.order_number,
            method = ?method,
            amount_cents = amount_cents,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Lists the payments on an order, oldest first.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Total paid so far against an order, in cents.
    pub async fn total_paid(&self, order_id: &str) -> DbResult<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE order_id = ?1")
                .bind(order_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

    /// Closes a served order: requires full payment, stamps `closed_at`.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidState)` - not served, or paid < total
    pub async fn close(&self, order_id: &str) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, order_id).await?;
        if order.status != OrderStatus::Served {
            return Err(DbError::invalid_state(format!(
                "cannot close a {} order",
                order.status
            )));
        }

        let paid: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE order_id = ?1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if paid < order.total_cents {
            return Err(DbError::invalid_state(format!(
                "order #{} is not fully paid ({} of {} cents)",
                order.order_number, paid, order.total_cents
            )));
        }

        sqlx::query(
            "UPDATE orders SET status = ?2, closed_at = ?3, updated_at = ?3 \
             WHERE id = ?1 AND status = 'served'",
        )
        .bind(order_id)
        .bind(OrderStatus::Closed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_number = order.order_number, "Order closed");

        self.get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }
}

/// Fetches an order inside the caller's transaction or fails NotFound.
async fn fetch_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order_id: &str,
) -> DbResult<Order> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| DbError::not_found("Order", order_id))
}

async fn insert_line(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    line: &OrderLine,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO order_lines (id, order_id, menu_item_id, name_snapshot, unit_price_cents, \
                                  tax_rate_bps, quantity, line_total_cents, note, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&line.id)
    .bind(&line.order_id)
    .bind(&line.menu_item_id)
    .bind(&line.name_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.tax_rate_bps)
    .bind(line.quantity)
    .bind(line.line_total_cents)
    .bind(&line.note)
    .bind(line.created_at)
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
    use crate::repository::menu::tests::insert_menu_item;
    use bistro_core::{User, UserRole};

    pub(crate) async fn insert_user(db: &Database, username: &str, role: UserRole) -> User {
        let now = Utc::now();
        let user = User {
            id: generate_id(),
            username: username.to_string(),
            display_name: username.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await.unwrap();
        user
    }

    pub(crate) fn line(menu_item_id: &str, quantity: i64) -> NewOrderLine {
        NewOrderLine {
            menu_item_id: menu_item_id.to_string(),
            quantity,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_create_snapshots_and_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        let order = db
            .orders()
            .create(None, 2, &waiter.id, None, &[line(&burger.id, 2)])
            .await
            .unwrap();

        assert_eq!(order.order_number, 1);
        assert_eq!(order.status, OrderStatus::Pending);
        // 2 × $10.99 = $21.98; 8.25% of 2198 = 181.335 → 181 (half-up)
        assert_eq!(order.subtotal_cents, 2198);
        assert_eq!(order.tax_cents, 181);
        assert_eq!(order.total_cents, 2379);

        let lines = db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name_snapshot, "Classic Burger");
        assert_eq!(lines[0].unit_price_cents, 1099);
        assert_eq!(lines[0].line_total_cents, 2198);

        // Menu price changes later don't touch the snapshot
        let mut changed = burger.clone();
        changed.price_cents = 1399;
        db.menu().update(&changed).await.unwrap();
        let lines = db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines[0].unit_price_cents, 1099);
    }

    #[tokio::test]
    async fn test_order_numbers_are_sequential() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        for expected in 1..=3 {
            let order = db
                .orders()
                .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
                .await
                .unwrap();
            assert_eq!(order.order_number, expected);
        }
    }

    #[tokio::test]
    async fn test_empty_order_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;

        let err = db.orders().create(None, 1, &waiter.id, None, &[]).await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_guarded_transition_rejects_repeat() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();

        let started = db
            .orders()
            .set_status(&order.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(started.status, OrderStatus::InProgress);

        // Second "start" loses the guard: the row is no longer pending
        let err = db
            .orders()
            .set_status(&order.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));

        // Skipping ahead is rejected before touching the database
        let err = db
            .orders()
            .set_status(&order.id, OrderStatus::InProgress, OrderStatus::Closed)
            .await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_revert_to_pending_releases_a_claim() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();

        // Only an in_progress claim can be handed back
        let err = db.orders().revert_to_pending(&order.id).await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));

        db.orders()
            .set_status(&order.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await
            .unwrap();

        let reverted = db.orders().revert_to_pending(&order.id).await.unwrap();
        assert_eq!(reverted.status, OrderStatus::Pending);

        // The claim is winnable again after the hand-back
        let restarted = db
            .orders()
            .set_status(&order.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(restarted.status, OrderStatus::InProgress);

        let err = db.orders().revert_to_pending("missing").await;
        assert!(matches!(err, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_lines_only_while_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;
        let fries = insert_menu_item(&db, "Fries", 399).await;

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();

        let updated = db
            .orders()
            .add_lines(&order.id, &[line(&fries.id, 2)])
            .await
            .unwrap();
        assert_eq!(updated.subtotal_cents, 1099 + 2 * 399);
        assert_eq!(db.orders().get_lines(&order.id).await.unwrap().len(), 2);

        db.orders()
            .set_status(&order.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await
            .unwrap();
        let err = db.orders().add_lines(&order.id, &[line(&fries.id, 1)]).await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_payment_and_close_flow() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let cashier = insert_user(&db, "ana", UserRole::Cashier).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        let order = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 2)])
            .await
            .unwrap();
        let repo = db.orders();
        repo.set_status(&order.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await
            .unwrap();
        repo.set_status(&order.id, OrderStatus::InProgress, OrderStatus::Ready)
            .await
            .unwrap();
        repo.set_status(&order.id, OrderStatus::Ready, OrderStatus::Served)
            .await
            .unwrap();

        // Underpaid close is refused
        repo.add_payment(&order.id, PaymentMethod::Card, 1000, None, &cashier.id)
            .await
            .unwrap();
        let err = repo.close(&order.id).await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));

        // Split tender: cash for the remainder, with change
        let remainder = order.total_cents - 1000;
        let cash = repo
            .add_payment(
                &order.id,
                PaymentMethod::Cash,
                remainder,
                Some(remainder + 121),
                &cashier.id,
            )
            .await
            .unwrap();
        assert_eq!(cash.change_cents, Some(121));

        let closed = repo.close(&order.id).await.unwrap();
        assert_eq!(closed.status, OrderStatus::Closed);
        assert!(closed.closed_at.is_some());

        // No payments on a closed order
        let err = repo
            .add_payment(&order.id, PaymentMethod::Cash, 100, None, &cashier.id)
            .await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_kitchen_queue_ordering() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        let first = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();
        let second = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();
        let third = db
            .orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();

        db.orders()
            .set_status(&second.id, OrderStatus::Pending, OrderStatus::InProgress)
            .await
            .unwrap();
        db.orders()
            .set_status(&third.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap();

        let queue = db.orders().kitchen_queue().await.unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].id, first.id);
        assert_eq!(queue[1].id, second.id);
    }
}
