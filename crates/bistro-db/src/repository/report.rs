//! # Report Repository
//!
//! Daily sales summaries and the end-of-day register close.
//!
//! ## The Day Close
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  daily_summary(date)      live aggregation over closed orders           │
//! │       │                   (re-runs give the current numbers)            │
//! │       ▼                                                                  │
//! │  close_day(date, by)      freezes that aggregation into an IMMUTABLE    │
//! │                           register_closes row; business_date is UNIQUE  │
//! │                           so a day can only ever be closed once         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are attributed to the business date of their `closed_at`
//! timestamp (UTC). Cancelled orders never appear in any figure.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use bistro_core::RegisterClose;

const CLOSE_COLUMNS: &str = "id, business_date, orders_closed, gross_cents, tax_cents, \
                             cash_cents, card_cents, closed_by, note, created_at";

/// Live aggregation of one business day's closed orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    /// YYYY-MM-DD.
    pub business_date: String,
    pub orders_closed: i64,
    /// Sum of order grand totals (tax included).
    pub gross_cents: i64,
    pub tax_cents: i64,
    /// Cash taken, net of change.
    pub cash_cents: i64,
    pub card_cents: i64,
}

/// Repository for reporting and register close operations.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Aggregates the closed orders of one business date (YYYY-MM-DD).
    pub async fn daily_summary(&self, business_date: &str) -> DbResult<DailySummary> {
        let (orders_closed, gross_cents, tax_cents): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0), COALESCE(SUM(tax_cents), 0) \
             FROM orders WHERE status = 'closed' AND date(closed_at) = ?1",
        )
        .bind(business_date)
        .fetch_one(&self.pool)
        .await?;

        let (cash_cents, card_cents): (i64, i64) = sqlx::query_as(
            "SELECT \
                COALESCE(SUM(CASE WHEN p.method = 'cash' THEN p.amount_cents ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN p.method = 'card' THEN p.amount_cents ELSE 0 END), 0) \
             FROM payments p \
             JOIN orders o ON o.id = p.order_id \
             WHERE o.status = 'closed' AND date(o.closed_at) = ?1",
        )
        .bind(business_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            business_date: business_date.to_string(),
            orders_closed,
            gross_cents,
            tax_cents,
            cash_cents,
            card_cents,
        })
    }

    /// Freezes a business date's summary into an immutable register
    /// close row.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the date was already closed
    /// * `Err(DbError::InvalidState)` - open tickets remain on that date
    pub async fn close_day(
        &self,
        business_date: &str,
        closed_by: &str,
        note: Option<&str>,
    ) -> DbResult<RegisterClose> {
        // A close with tickets still on the floor would under-report the
        // day; force them to be closed or cancelled first.
        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders \
             WHERE status NOT IN ('closed', 'cancelled') AND date(created_at) = ?1",
        )
        .bind(business_date)
        .fetch_one(&self.pool)
        .await?;
        if open > 0 {
            return Err(DbError::invalid_state(format!(
                "{} open order(s) remain on {}",
                open, business_date
            )));
        }

        let summary = self.daily_summary(business_date).await?;

        let close = RegisterClose {
            id: generate_id(),
            business_date: business_date.to_string(),
            orders_closed: summary.orders_closed,
            gross_cents: summary.gross_cents,
            tax_cents: summary.tax_cents,
            cash_cents: summary.cash_cents,
            card_cents: summary.card_cents,
            closed_by: closed_by.to_string(),
            note: note.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO register_closes (id, business_date, orders_closed, gross_cents, \
                                          tax_cents, cash_cents, card_cents, closed_by, note, \
                                          created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&close.id)
        .bind(&close.business_date)
        .bind(close.orders_closed)
        .bind(close.gross_cents)
        .bind(close.tax_cents)
        .bind(close.cash_cents)
        .bind(close.card_cents)
        .bind(&close.closed_by)
        .bind(&close.note)
        .bind(close.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            business_date = %close.business_date,
            orders_closed = close.orders_closed,
            gross_cents = close.gross_cents,
            "Register closed"
        );

        Ok(close)
    }

    /// Gets the register close for a business date, if it exists.
    pub async fn get_close(&self, business_date: &str) -> DbResult<Option<RegisterClose>> {
        let close = sqlx::query_as::<_, RegisterClose>(&format!(
            "SELECT {CLOSE_COLUMNS} FROM register_closes WHERE business_date = ?1"
        ))
        .bind(business_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(close)
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
    use bistro_core::{OrderStatus, PaymentMethod, UserRole};

    async fn closed_order(db: &Database, waiter: &str, cashier: &str, menu_item_id: &str) {
        let order = db
            .orders()
            .create(None, 1, waiter, None, &[line(menu_item_id, 1)])
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
        repo.add_payment(&order.id, PaymentMethod::Card, order.total_cents, None, cashier)
            .await
            .unwrap();
        repo.close(&order.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_daily_summary_and_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let cashier = insert_user(&db, "ana", UserRole::Cashier).await;
        let manager = insert_user(&db, "maria", UserRole::Manager).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        closed_order(&db, &waiter.id, &cashier.id, &burger.id).await;
        closed_order(&db, &waiter.id, &cashier.id, &burger.id).await;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let summary = db.reports().daily_summary(&today).await.unwrap();
        assert_eq!(summary.orders_closed, 2);
        // per order: $10.99 + 8.25% tax (91 cents, half-up) = 1190
        assert_eq!(summary.gross_cents, 2 * 1190);
        assert_eq!(summary.tax_cents, 2 * 91);
        assert_eq!(summary.card_cents, 2 * 1190);
        assert_eq!(summary.cash_cents, 0);

        let close = db
            .reports()
            .close_day(&today, &manager.id, Some("smooth shift"))
            .await
            .unwrap();
        assert_eq!(close.orders_closed, 2);
        assert_eq!(close.gross_cents, summary.gross_cents);

        let stored = db.reports().get_close(&today).await.unwrap().unwrap();
        assert_eq!(stored.id, close.id);

        // Same date cannot be closed twice
        let err = db.reports().close_day(&today, &manager.id, None).await;
        assert!(matches!(err, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_close_refused_with_open_tickets() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let waiter = insert_user(&db, "sam", UserRole::Waiter).await;
        let manager = insert_user(&db, "maria", UserRole::Manager).await;
        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;

        db.orders()
            .create(None, 1, &waiter.id, None, &[line(&burger.id, 1)])
            .await
            .unwrap();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let err = db.reports().close_day(&today, &manager.id, None).await;
        assert!(matches!(err, Err(DbError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_empty_day_summary_is_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let summary = db.reports().daily_summary("2026-01-01").await.unwrap();
        assert_eq!(summary.orders_closed, 0);
        assert_eq!(summary.gross_cents, 0);
        assert_eq!(summary.cash_cents, 0);
    }
}
