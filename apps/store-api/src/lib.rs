//! # Tribune Store API
//!
//! REST surface over the loyalty, pricing and order-fulfillment engine.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Request Lifecycle                                │
//! │                                                                         │
//! │  HTTP request                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes.rs ── thin axum handlers: deserialize, authenticate, call      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  services/* ── guards + business rules (tribune-core) + persistence    │
//! │       │        (tribune-db) + display conversion (currency.rs)         │
//! │       ▼                                                                 │
//! │  ApiError ── every failure maps to exactly one HTTP status             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The library target exists so integration tests can drive the service
//! layer directly against an in-memory database.

pub mod auth;
pub mod config;
pub mod currency;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

pub use config::StoreConfig;
pub use error::{ApiError, ErrorKind};
pub use state::AppState;
