//! # smartpos-core: Pure Business Logic for the SmartPOS Sale Engine
//!
//! Everything that decides *what* a sale looks like lives here: pricing a
//! cart, settling the paid/pending split, approving store credit, and
//! computing loyalty points. Nothing in this crate touches the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SmartPOS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/server (axum HTTP)                         │   │
//! │  │     POST /ventas ──► GET /ventas/{id} ──► GET /clientes/…       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               smartpos-db (SaleService, repositories)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ smartpos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ credit  │ │ loyalty  │ │   │
//! │  │   │ Product │ │  Money  │ │ pricing │ │ policy  │ │  points  │ │   │
//! │  │   │  Sale   │ │ (cents) │ │ settle  │ │ due date│ │          │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, Debt, CashSession, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart pricing and payment settlement
//! - [`credit`] - Credit policy and debt due dates
//! - [`loyalty`] - Loyalty point accrual
//! - [`policy`] - Deployment knobs (negative stock, credit term, points unit)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use smartpos_core::money::Money;
//! use smartpos_core::loyalty::points_for;
//!
//! let total = Money::from_cents(250_000); // $2,500.00
//! assert_eq!(points_for(total, Money::from_cents(100_000)), 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod credit;
pub mod error;
pub mod loyalty;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{price_cart, settle, PricedCart, PricedLine, Settlement};
pub use credit::{CreditCheck, DEFAULT_CREDIT_DAYS};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use policy::SalePolicy;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and keeps one sale inside one short transaction.
pub const MAX_CART_ITEMS: usize = 100;

/// Payment method recorded when the caller sends none.
pub const DEFAULT_PAYMENT_METHOD: &str = "EFECTIVO";
