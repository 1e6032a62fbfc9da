//! Request/response DTOs and JSON mapping.
//!
//! The HTTP boundary speaks camelCase JSON; domain types stay snake_case
//! Rust. `From` impls do the mapping in one place so handlers stay thin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{
    DiningTable, MenuItem, MovementKind, Order, OrderLine, OrderStatus, Payment, PaymentMethod,
    RecipeEntry, RegisterClose, StockItem, StockMovement, User, UserRole,
};
use bistro_db::{ConsumptionReport, DailySummary, Deduction};

use crate::auth::TokenPair;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserDto,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        UserDto {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
    /// Optional password reset
    pub password: Option<String>,
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDto {
    pub id: String,
    pub name: String,
    pub zone: Option<String>,
    pub seats: i64,
    pub is_active: bool,
}

impl From<DiningTable> for TableDto {
    fn from(t: DiningTable) -> Self {
        TableDto {
            id: t.id,
            name: t.name,
            zone: t.zone,
            seats: t.seats,
            is_active: t.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub name: String,
    pub zone: Option<String>,
    #[serde(default = "default_seats")]
    pub seats: i64,
}

fn default_seats() -> i64 {
    4
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableRequest {
    pub name: String,
    pub zone: Option<String>,
    pub seats: i64,
    pub is_active: bool,
}

// =============================================================================
// Menu & recipes
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub tax_rate_bps: u32,
    pub is_active: bool,
}

impl From<MenuItem> for MenuItemDto {
    fn from(m: MenuItem) -> Self {
        MenuItemDto {
            id: m.id,
            name: m.name,
            category: m.category,
            price_cents: m.price_cents,
            tax_rate_bps: m.tax_rate_bps,
            is_active: m.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub price_cents: i64,
    #[serde(default)]
    pub tax_rate_bps: u32,
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemRequest {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub tax_rate_bps: u32,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeEntryDto {
    pub id: String,
    pub stock_item_id: String,
    pub qty_per_unit_milli: i64,
}

impl From<RecipeEntry> for RecipeEntryDto {
    fn from(r: RecipeEntry) -> Self {
        RecipeEntryDto {
            id: r.id,
            stock_item_id: r.stock_item_id,
            qty_per_unit_milli: r.qty_per_unit_milli,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeEntryInput {
    pub stock_item_id: String,
    pub qty_per_unit_milli: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRecipeRequest {
    pub entries: Vec<RecipeEntryInput>,
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItemDto {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub on_hand_qty: i64,
    pub unit_cost_cents: i64,
    pub reorder_level: Option<i64>,
    pub is_active: bool,
}

impl From<StockItem> for StockItemDto {
    fn from(s: StockItem) -> Self {
        StockItemDto {
            id: s.id,
            name: s.name,
            unit: s.unit,
            on_hand_qty: s.on_hand_qty,
            unit_cost_cents: s.unit_cost_cents,
            reorder_level: s.reorder_level,
            is_active: s.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockItemRequest {
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub on_hand_qty: i64,
    #[serde(default)]
    pub unit_cost_cents: i64,
    pub reorder_level: Option<i64>,
}

fn default_unit() -> String {
    "pcs".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockItemRequest {
    pub name: String,
    pub unit: String,
    pub unit_cost_cents: i64,
    pub reorder_level: Option<i64>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveStockRequest {
    pub quantity: i64,
    pub unit_cost_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub delta: i64,
    pub reason: String,
    /// Tag the movement as spoilage instead of a count correction
    #[serde(default)]
    pub waste: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
    pub id: String,
    pub stock_item_id: String,
    pub quantity_delta: i64,
    pub kind: MovementKind,
    pub unit_cost_cents: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<StockMovement> for MovementDto {
    fn from(m: StockMovement) -> Self {
        MovementDto {
            id: m.id,
            stock_item_id: m.stock_item_id,
            quantity_delta: m.quantity_delta,
            kind: m.kind,
            unit_cost_cents: m.unit_cost_cents,
            reason: m.reason,
            created_at: m.created_at,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub order_number: i64,
    pub table_id: Option<String>,
    pub guest_count: i64,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub opened_by: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        OrderDto {
            id: o.id,
            order_number: o.order_number,
            table_id: o.table_id,
            guest_count: o.guest_count,
            status: o.status,
            subtotal_cents: o.subtotal_cents,
            tax_cents: o.tax_cents,
            total_cents: o.total_cents,
            opened_by: o.opened_by,
            note: o.note,
            created_at: o.created_at,
            closed_at: o.closed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    pub id: String,
    pub menu_item_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
    pub note: Option<String>,
}

impl From<OrderLine> for OrderLineDto {
    fn from(l: OrderLine) -> Self {
        OrderLineDto {
            id: l.id,
            menu_item_id: l.menu_item_id,
            name: l.name_snapshot,
            unit_price_cents: l.unit_price_cents,
            quantity: l.quantity,
            line_total_cents: l.line_total_cents,
            note: l.note,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub menu_item_id: String,
    pub quantity: i64,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub table_id: Option<String>,
    #[serde(default = "default_guest_count")]
    pub guest_count: i64,
    pub note: Option<String>,
    pub lines: Vec<OrderLineInput>,
}

fn default_guest_count() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLinesRequest {
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailDto {
    #[serde(flatten)]
    pub order: OrderDto,
    pub lines: Vec<OrderLineDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionDto {
    pub stock_item_id: String,
    pub name: String,
    pub quantity: i64,
}

impl From<Deduction> for DeductionDto {
    fn from(d: Deduction) -> Self {
        DeductionDto {
            stock_item_id: d.stock_item_id,
            name: d.name,
            quantity: d.quantity,
        }
    }
}

/// Response to the consumption trigger: the ticket now in progress,
/// plus what the engine deducted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOrderResponse {
    pub order: OrderDto,
    pub deductions: Vec<DeductionDto>,
}

impl StartOrderResponse {
    pub fn new(order: Order, report: ConsumptionReport) -> Self {
        StartOrderResponse {
            order: order.into(),
            deductions: report.deductions.into_iter().map(DeductionDto::from).collect(),
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub received_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        PaymentDto {
            id: p.id,
            method: p.method,
            amount_cents: p.amount_cents,
            tendered_cents: p.tendered_cents,
            change_cents: p.change_cents,
            received_by: p.received_by,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub tendered_cents: Option<i64>,
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryDto {
    pub business_date: String,
    pub orders_closed: i64,
    pub gross_cents: i64,
    pub tax_cents: i64,
    pub cash_cents: i64,
    pub card_cents: i64,
}

impl From<DailySummary> for DailySummaryDto {
    fn from(s: DailySummary) -> Self {
        DailySummaryDto {
            business_date: s.business_date,
            orders_closed: s.orders_closed,
            gross_cents: s.gross_cents,
            tax_cents: s.tax_cents,
            cash_cents: s.cash_cents,
            card_cents: s.card_cents,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCloseDto {
    pub id: String,
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

impl From<RegisterClose> for RegisterCloseDto {
    fn from(c: RegisterClose) -> Self {
        RegisterCloseDto {
            id: c.id,
            business_date: c.business_date,
            orders_closed: c.orders_closed,
            gross_cents: c.gross_cents,
            tax_cents: c.tax_cents,
            cash_cents: c.cash_cents,
            card_cents: c.card_cents,
            closed_by: c.closed_by,
            note: c.note,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRegisterRequest {
    /// YYYY-MM-DD
    pub date: String,
    pub note: Option<String>,
}
