//! # Bistro Server
//!
//! REST API server for Bistro POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bistro Server                                   │
//! │                                                                         │
//! │  Admin SPA ───► HTTP/JSON (8080) ───► axum handlers ───► bistro-db     │
//! │                        │                                   │            │
//! │                        ▼                                   ▼            │
//! │                 JWT middleware                          SQLite          │
//! │                 (bearer tokens)                   (WAL, foreign keys)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The crate is a library so the black-box test suite can spawn the
//! exact production router against an in-memory database.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;
