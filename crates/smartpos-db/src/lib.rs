//! # smartpos-db: Database Layer and Sale Engine
//!
//! SQLite access for SmartPOS, and the transaction that turns a cart into
//! a sale.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SmartPOS Data Flow                               │
//! │                                                                         │
//! │  POST /ventas (smartpos-server)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   smartpos-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐    │   │
//! │  │   │  SaleService  │──►│  Repositories  │   │  Migrations  │    │   │
//! │  │   │ (service/)    │   │ product        │   │  (embedded)  │    │   │
//! │  │   │ one tx / sale │   │ customer, sale │   │ 0001_initial │    │   │
//! │  │   └───────┬───────┘   │ debt, cash     │   └──────────────┘    │   │
//! │  │           │           │ user           │                        │   │
//! │  │           ▼           └────────┬───────┘                        │   │
//! │  │   ┌───────────────┐            │                                │   │
//! │  │   │   Database    │◄───────────┘                                │   │
//! │  │   │   (pool.rs)   │                                             │   │
//! │  │   └───────────────┘                                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`service`] - The sale transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smartpos_db::{Database, DbConfig};
//! use smartpos_core::SalePolicy;
//!
//! let db = Database::new(DbConfig::new("smartpos.db")).await?;
//! let sales = db.sales_service(SalePolicy::default());
//! let detail = sales.create_sale(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::sale::{SaleError, SaleResult, SaleService};

// Repository re-exports for convenience
pub use repository::cash::CashRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
