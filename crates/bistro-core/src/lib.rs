//! # bistro-core: Pure Business Logic for Bistro POS
//!
//! This crate is the **heart** of Bistro POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Admin SPA (separate repository)                 │   │
//! │  │    Floor plan ──► Orders ──► Kitchen ──► Cashier ──► Reports   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Axum REST Handlers                           │   │
//! │  │    login, create_order, start_ticket, receive_stock, etc.      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  recipe   │  │ validation│  │   │
//! │  │   │ MenuItem  │  │   Money   │  │ RecipeQty │  │   rules   │  │   │
//! │  │   │   Order   │  │  TaxCalc  │  │  demand   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bistro-db (Database Layer)                   │   │
//! │  │       SQLite queries, migrations, consumption engine            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MenuItem, Order, StockItem, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`recipe`] - Recipe quantities and ingredient demand math
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Arithmetic**: Money is in cents (i64), recipe quantities in
//!    milli-units (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::money::Money;
//! use bistro_core::recipe::RecipeQty;
//! use bistro_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(1250); // $12.50
//!
//! // Calculate tax
//! let tax = price.calculate_tax(TaxRate::from_bps(825)); // 8.25%
//! assert_eq!(tax.cents(), 103);
//!
//! // 0.25 lb of beef per burger, 3 burgers ordered:
//! // fractional demand always rounds UP to whole stock units
//! let beef = RecipeQty::from_milli(250);
//! assert_eq!(beef.required_for(3), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod recipe;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bistro_core::Money` instead of
// `use bistro_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use recipe::RecipeQty;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single order
///
/// ## Business Reason
/// Prevents runaway tickets and keeps kitchen displays readable.
/// Can be made configurable per-venue in future versions.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single menu item on one line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
