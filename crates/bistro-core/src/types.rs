//! # Domain Types
//!
//! Core domain types used throughout Bistro POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │     Order       │   │   StockItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  order_number   │   │  on_hand_qty    │       │
//! │  │  price_cents    │   │  status         │   │  unit_cost      │       │
//! │  └────────┬────────┘   │  total_cents    │   └────────▲────────┘       │
//! │           │            └─────────────────┘            │                 │
//! │           │    ┌─────────────────┐                    │                 │
//! │           └───►│  RecipeEntry    │────────────────────┘                 │
//! │                │  qty_per_unit   │   (menu item → ingredient map)      │
//! │                └─────────────────┘                                     │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderStatus   │   │  MovementKind   │   │ PaymentMethod   │       │
//! │  │  Pending        │   │  Consumption    │   │  Cash           │       │
//! │  │  InProgress     │   │  Received       │   │  Card           │       │
//! │  │  Ready/Served   │   │  Adjustment     │   └─────────────────┘       │
//! │  │  Closed/Cancel  │   │  Waste          │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where humans need one: `order_number` ("Order #17"),
//!   unique table/stock names

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;
use crate::recipe::RecipeQty;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25% (e.g., Texas sales tax)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// User & Roles
// =============================================================================

/// Staff role controlling endpoint access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including user administration.
    Admin,
    /// Day-to-day management: stock, menu, register close.
    Manager,
    /// Payment recording and order close.
    Cashier,
    /// Table and order management.
    Waiter,
    /// Kitchen queue and ticket transitions.
    Kitchen,
}

impl UserRole {
    /// Whether this role may administer user accounts.
    #[inline]
    pub const fn can_manage_users(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Whether this role may run the accounting day close.
    #[inline]
    pub const fn can_close_register(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }

    /// Canonical lowercase name, matching the database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Cashier => "cashier",
            UserRole::Waiter => "waiter",
            UserRole::Kitchen => "kitchen",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "cashier" => Ok(UserRole::Cashier),
            "waiter" => Ok(UserRole::Waiter),
            "kitchen" => Ok(UserRole::Kitchen),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A staff member account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    /// Login name, unique.
    pub username: String,
    /// Name shown on tickets and receipts.
    pub display_name: String,
    /// argon2 PHC string. Never serialized to the API layer.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Dining Table
// =============================================================================

/// A physical table in the dining room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: String,
    /// Human name, unique ("T1", "Patio 3").
    pub name: String,
    /// Optional floor zone for the floor plan view.
    pub zone: Option<String>,
    pub seats: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Menu Item & Recipe
// =============================================================================

/// An item on the menu, sellable on orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Price in cents (smallest currency unit).
    pub price_cents: i64,
    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,
    /// Whether item is active (soft delete).
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// Association between a menu item and a required quantity of a stock
/// item per unit sold.
///
/// A menu item with zero recipe entries has no inventory backing: the
/// consumption engine skips it entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecipeEntry {
    pub id: String,
    pub menu_item_id: String,
    pub stock_item_id: String,
    /// Required quantity per unit sold, in thousandths of a stock unit.
    pub qty_per_unit_milli: i64,
}

impl RecipeEntry {
    /// Returns the per-unit quantity as a RecipeQty.
    #[inline]
    pub fn qty_per_unit(&self) -> RecipeQty {
        RecipeQty::from_milli(self.qty_per_unit_milli)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// A stock-keeping unit tracked by the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockItem {
    pub id: String,
    /// Ingredient name, unique ("Ground Beef", "Burger Bun").
    pub name: String,
    /// Unit of measure for display: "lb", "pcs", "l".
    pub unit: String,
    /// Whole units on hand. Never negative as committed state.
    pub on_hand_qty: i64,
    /// Current unit cost; snapshotted onto movements.
    pub unit_cost_cents: i64,
    /// Optional low-stock threshold for the reorder report.
    pub reorder_level: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Whether the on-hand quantity has fallen to or below the
    /// reorder threshold (if one is configured).
    pub fn is_below_reorder(&self) -> bool {
        match self.reorder_level {
            Some(level) => self.on_hand_qty <= level,
            None => false,
        }
    }
}

/// Kind tag on a stock movement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Recipe-based deduction by the consumption engine.
    Consumption,
    /// Goods received from a supplier.
    Received,
    /// Manual correction (count discrepancy).
    Adjustment,
    /// Spoilage / breakage write-off.
    Waste,
}

/// Immutable audit record of a stock quantity change.
///
/// ## Lifecycle
/// Append-only. Every committed change to `StockItem::on_hand_qty` has
/// exactly one movement row with the matching signed delta; quantities
/// are never mutated except through movement-producing operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub stock_item_id: String,
    /// Signed delta: negative for consumption/waste, positive for receiving.
    pub quantity_delta: i64,
    pub kind: MovementKind,
    /// Unit cost at the time of the movement (cost snapshot).
    pub unit_cost_cents: i64,
    /// Free-text reason; the consumption engine tags "Order #<n>".
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order / kitchen ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Taken, not yet sent to the kitchen.
    Pending,
    /// Kitchen is preparing; stock has been consumed.
    InProgress,
    /// Plated and waiting for pickup.
    Ready,
    /// Delivered to the table.
    Served,
    /// Paid and closed (terminal).
    Closed,
    /// Abandoned at any pre-close stage (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Whether moving from `self` to `to` is a legal transition.
    ///
    /// ## State Machine
    /// ```text
    /// pending ──► in_progress ──► ready ──► served ──► closed
    ///    │             │            │
    ///    └─────────────┴────────────┴──────► cancelled
    /// ```
    ///
    /// The `pending → in_progress` edge is the ONLY trigger for the
    /// consumption engine. Guarding it here (and with a guarded UPDATE
    /// at the call site) is what keeps a double "start" from deducting
    /// stock twice — the engine itself never checks status.
    pub const fn can_transition(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::InProgress, OrderStatus::Ready)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
                | (OrderStatus::Ready, OrderStatus::Served)
                | (OrderStatus::Ready, OrderStatus::Cancelled)
                | (OrderStatus::Served, OrderStatus::Closed)
        )
    }

    /// Whether no further transitions are possible.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }

    /// Canonical snake_case name, matching the database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A table order / kitchen ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Human-facing sequential number ("Order #17").
    pub order_number: i64,
    pub table_id: Option<String>,
    pub guest_count: i64,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// User who opened the order.
    pub opened_by: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item on an order.
/// Uses snapshot pattern to freeze menu item data at ordering time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Menu item name at ordering time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at ordering time (frozen).
    pub unit_price_cents: i64,
    /// Tax rate at ordering time (frozen).
    pub tax_rate_bps: u32,
    /// Quantity ordered.
    pub quantity: i64,
    /// Line total before tax (unit_price × quantity).
    pub line_total_cents: i64,
    /// Kitchen note ("no onions").
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
}

/// A payment towards an order.
/// An order can have multiple payments for split tender scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    /// Amount paid in cents.
    pub amount_cents: i64,
    /// For cash: amount customer gave (to calculate change).
    pub tendered_cents: Option<i64>,
    /// For cash: change returned to customer.
    pub change_cents: Option<i64>,
    /// Cashier who recorded the payment.
    pub received_by: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Register Close
// =============================================================================

/// Immutable day-close snapshot for the accounting report.
///
/// One row per business date; closing the same date twice is a
/// uniqueness violation by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RegisterClose {
    pub id: String,
    /// YYYY-MM-DD.
    pub business_date: String,
    pub orders_closed: i64,
    pub gross_cents: i64,
    pub tax_cents: i64,
    pub cash_cents: i64,
    pub card_cents: i64,
    pub closed_by: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_status_transition_matrix() {
        use OrderStatus::*;

        // Legal workflow edges
        assert!(Pending.can_transition(InProgress));
        assert!(InProgress.can_transition(Ready));
        assert!(Ready.can_transition(Served));
        assert!(Served.can_transition(Closed));

        // Cancellation legal at every pre-served stage
        assert!(Pending.can_transition(Cancelled));
        assert!(InProgress.can_transition(Cancelled));
        assert!(Ready.can_transition(Cancelled));

        // The consumption double-trigger guard: a ticket already in
        // progress can never re-enter in_progress
        assert!(!InProgress.can_transition(InProgress));
        assert!(!Ready.can_transition(InProgress));

        // No skipping ahead, no resurrecting terminals
        assert!(!Pending.can_transition(Ready));
        assert!(!Pending.can_transition(Closed));
        assert!(!Served.can_transition(Cancelled));
        assert!(!Closed.can_transition(Pending));
        assert!(!Cancelled.can_transition(Pending));

        assert!(Closed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Served.is_terminal());
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_manage_users());
        assert!(!UserRole::Manager.can_manage_users());

        assert!(UserRole::Admin.can_close_register());
        assert!(UserRole::Manager.can_close_register());
        assert!(!UserRole::Cashier.can_close_register());
        assert!(!UserRole::Waiter.can_close_register());
        assert!(!UserRole::Kitchen.can_close_register());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::Admin,
            UserRole::Manager,
            UserRole::Cashier,
            UserRole::Waiter,
            UserRole::Kitchen,
        ] {
            let parsed: UserRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("chef".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_stock_reorder_threshold() {
        let item = StockItem {
            id: "s1".to_string(),
            name: "Burger Bun".to_string(),
            unit: "pcs".to_string(),
            on_hand_qty: 3,
            unit_cost_cents: 35,
            reorder_level: Some(5),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.is_below_reorder());

        let no_threshold = StockItem {
            reorder_level: None,
            ..item
        };
        assert!(!no_threshold.is_below_reorder());
    }
}
