//! # Repository Module
//!
//! Database repository implementations for the sale engine.
//!
//! ## Two Access Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Reads outside a sale                  Writes inside a sale             │
//! │  ─────────────────────                 ──────────────────────           │
//! │  db.sales().get_detail(..)             let mut tx = pool.begin()        │
//! │  db.customers().get_by_id(..)          sale::insert_sale(&mut *tx, ..)  │
//! │       │                                product::decrement_stock(..)     │
//! │       │ SqlitePool                          │ &mut SqliteConnection     │
//! │       ▼                                     ▼                           │
//! │  any pooled connection                 the transaction's connection     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repository structs wrap the pool. The free functions next to them take
//! the transaction's connection, so every write of one sale commits or
//! rolls back together.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog reads, stock decrement
//! - [`CustomerRepository`] - Customers, debt balance, points
//! - [`SaleRepository`] - Sale headers, lines, joined read model
//! - [`debt`] - Receivables, written and read only inside the sale flow
//! - [`CashRepository`] - Cash sessions and movements
//! - [`UserRepository`] - Businesses and users
//!
//! [`ProductRepository`]: product::ProductRepository
//! [`CustomerRepository`]: customer::CustomerRepository
//! [`SaleRepository`]: sale::SaleRepository
//! [`CashRepository`]: cash::CashRepository
//! [`UserRepository`]: user::UserRepository

pub mod cash;
pub mod customer;
pub mod debt;
pub mod product;
pub mod sale;
pub mod user;
