//! # Product Repository
//!
//! Catalog reads for pricing and the stock decrement a sale applies.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Decrement Per Sale Line                        │
//! │                                                                         │
//! │  allow_negative_stock = true (default)                                 │
//! │    UPDATE products SET stock = stock - qty, version = version + 1      │
//! │    WHERE id = ? AND business_id = ?                                    │
//! │    → never blocks, stock may drop below zero                           │
//! │                                                                         │
//! │  allow_negative_stock = false                                          │
//! │    ... AND stock >= qty                                                │
//! │    → 0 rows affected means a concurrent sale took the stock            │
//! │    → DbError::Conflict, whole sale rolls back                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decrement is an in-SQL delta, never a read-modify-write.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use smartpos_core::Product;

const PRODUCT_COLUMNS: &str = "id, business_id, sku, name, cost_cents, price_cents, stock, \
                               is_active, version, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_id(&business_id, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, scoped to a business.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Unknown id, or the product belongs to another business
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ? AND business_id = ?",
            PRODUCT_COLUMNS
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, sku, name,
                cost_cents, price_cents, stock,
                is_active, version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.business_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.cost_cents)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.version)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Loads the given products of one business, keyed by id.
///
/// Ids that don't exist or belong to another business are simply absent
/// from the map. Duplicates in `ids` are fine.
pub async fn find_many<'e, E>(
    executor: E,
    business_id: &str,
    ids: &[&str],
) -> DbResult<HashMap<String, Product>>
where
    E: SqliteExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM products WHERE business_id = ? AND id IN ({})",
        PRODUCT_COLUMNS, placeholders
    );

    let mut query = sqlx::query_as::<_, Product>(&sql).bind(business_id);
    for id in ids {
        query = query.bind(*id);
    }

    let products = query.fetch_all(executor).await?;

    debug!(requested = ids.len(), found = products.len(), "Loaded products");

    Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
}

/// Decrements a product's stock by `quantity` and bumps its version.
///
/// ## Errors
/// - `DbError::NotFound` - product vanished from the business
/// - `DbError::Conflict` - strict policy and not enough stock left
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
    quantity: i64,
    allow_negative_stock: bool,
) -> DbResult<()> {
    let now = Utc::now();

    let result = if allow_negative_stock {
        sqlx::query(
            r#"
            UPDATE products SET
                stock = stock - ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .bind(business_id)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            r#"
            UPDATE products SET
                stock = stock - ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND business_id = ? AND stock >= ?
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .bind(business_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?
    };

    if result.rows_affected() == 0 {
        return Err(if allow_negative_stock {
            DbError::not_found("Product", product_id)
        } else {
            DbError::conflict(format!("stock of product {} changed during the sale", product_id))
        });
    }

    debug!(product_id = %product_id, quantity, "Stock decremented");
    Ok(())
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
