//! # tribune-db: Database Layer for Tribune
//!
//! This crate provides database access for the Tribune shop backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tribune Data Flow                                │
//! │                                                                         │
//! │  Service call (checkout, redeem_referral, create_payment, ...)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tribune-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (user, cart, │    │  (embedded)  │  │   │
//! │  │   │               │    │  order, ...)  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ transactions  │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite database (WAL)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Discipline
//!
//! Every mutation that touches more than one row commits atomically:
//! checkout (order + items + stock decrements + cart delete), referral
//! redemption (both user rows + referred set), payment creation (payment
//! row + point accrual), history deletion (ledger row + point reversal),
//! order cancellation (status + restock), and cart merge. Conditional
//! updates (`WHERE quantity >= ?`, `WHERE referral_code_used IS NULL`)
//! double as compare-and-swap guards under concurrency.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per entity

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
