//! # bistro-db: Database Layer for Bistro POS
//!
//! This crate provides database access for the Bistro POS backend.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro POS Data Flow                             │
//! │                                                                         │
//! │  REST handler (POST /orders/:id/start)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bistro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │   │  Repositories  │   │  Consumption  │  │   │
//! │  │   │   (pool.rs)   │   │ (order, stock, │   │    Engine     │  │   │
//! │  │   │               │   │  menu, user,   │   │               │  │   │
//! │  │   │ SqlitePool    │◄──│  table, report)│   │ one tx per    │  │   │
//! │  │   │ Migrations    │   │                │   │ order, full   │  │   │
//! │  │   │               │◄──┴────────────────┴───│ rollback      │  │   │
//! │  │   └───────────────┘                        └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode, foreign keys ON)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (order, stock, menu, ...)
//! - [`consumption`] - The inventory consumption engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bistro_db::{Database, DbConfig};
//!
//! // Create database with default config (runs migrations)
//! let db = Database::new(DbConfig::new("path/to/bistro.db")).await?;
//!
//! // Use repositories
//! let queue = db.orders().kitchen_queue().await?;
//!
//! // Start a ticket: deduct recipe ingredients atomically
//! let report = db.consumption().consume_order(&order_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod consumption;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use consumption::{ConsumptionEngine, ConsumptionError, ConsumptionReport, Deduction, Shortfall};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::menu::MenuRepository;
pub use repository::order::{NewOrderLine, OrderRepository};
pub use repository::report::{DailySummary, ReportRepository};
pub use repository::stock::StockRepository;
pub use repository::table::TableRepository;
pub use repository::user::UserRepository;
