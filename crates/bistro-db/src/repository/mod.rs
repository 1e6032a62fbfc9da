//! # Repository Module
//!
//! Database repository implementations for Bistro POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  REST handler                                                          │
//! │       │                                                                 │
//! │       │  db.stock().receive(&id, 24, Some(35)).await                   │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  StockRepository                                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── receive(&self, id, qty, cost)   ← quantity change + movement row │
//! │  ├── adjust(&self, id, delta, why)     in ONE transaction              │
//! │  └── movements(&self, id, limit)                                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Movement-producing invariant enforced in one place                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Staff accounts
//! - [`table::TableRepository`] - Dining tables
//! - [`menu::MenuRepository`] - Menu items + recipe entries
//! - [`stock::StockRepository`] - Stock items + movement audit trail
//! - [`order::OrderRepository`] - Orders, lines, payments, status machine
//! - [`report::ReportRepository`] - Daily summaries + register closes

pub mod menu;
pub mod order;
pub mod report;
pub mod stock;
pub mod table;
pub mod user;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
