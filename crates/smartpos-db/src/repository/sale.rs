//! # Sale Repository
//!
//! Sale headers and lines. Rows are written once inside the sale
//! transaction and never updated.
//!
//! ## Read Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       get_detail(business, id)                          │
//! │                                                                         │
//! │  sales ──────────────► Sale header                                     │
//! │  sale_lines ─┬───────► lines ordered by position                       │
//! │  products ◄──┘         each joined with its product                    │
//! │  customers ──────────► customer (optional)                             │
//! │  users ──────────────► cashier                                         │
//! │  debts + payments ───► debt (optional, CREDIT sales only)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{customer, debt, product, user};
use smartpos_core::{Sale, SaleDetail, SaleLine, SaleLineDetail};

const SALE_COLUMNS: &str = "id, business_id, customer_id, user_id, total_cents, payment_method, \
                            payment_state, amount_paid_cents, pending_cents, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND business_id = ?",
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lists sale headers of a business, newest first.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE business_id = ? ORDER BY created_at DESC, rowid DESC",
            SALE_COLUMNS
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(business_id = %business_id, count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Gets all lines of a sale in cart order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, business_id, product_id, position,
                   quantity, unit_price_cents, subtotal_cents
            FROM sale_lines
            WHERE sale_id = ?
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Loads the fully joined sale.
    ///
    /// ## Returns
    /// * `Ok(Some(SaleDetail))` - header, lines with products, customer,
    ///   cashier and debt with payments
    /// * `Ok(None)` - no such sale in this business
    pub async fn get_detail(&self, business_id: &str, id: &str) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get_by_id(business_id, id).await? else {
            return Ok(None);
        };

        let lines = self.get_lines(&sale.id).await?;

        let product_ids: Vec<&str> = lines.iter().map(|l| l.product_id.as_str()).collect();
        let products = product::find_many(&self.pool, business_id, &product_ids).await?;

        let lines = lines
            .into_iter()
            .map(|line| {
                // Lines of one product share the row
                let product = products
                    .get(&line.product_id)
                    .cloned()
                    .ok_or_else(|| DbError::not_found("Product", line.product_id.clone()))?;
                Ok(SaleLineDetail { line, product })
            })
            .collect::<DbResult<Vec<_>>>()?;

        let customer = match &sale.customer_id {
            Some(customer_id) => {
                customer::find_in_business(&self.pool, business_id, customer_id).await?
            }
            None => None,
        };

        let cashier = user::find_cashier(&self.pool, &sale.user_id).await?;
        let debt = debt::find_detail_by_sale(&self.pool, business_id, &sale.id).await?;

        Ok(Some(SaleDetail {
            sale,
            lines,
            customer,
            cashier,
            debt,
        }))
    }

    /// Counts sales of a business.
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE business_id = ?")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Inserts a sale header.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total = %sale.total(), "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, business_id, customer_id, user_id,
            total_cents, payment_method, payment_state,
            amount_paid_cents, pending_cents, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.business_id)
    .bind(&sale.customer_id)
    .bind(&sale.user_id)
    .bind(sale.total_cents)
    .bind(&sale.payment_method)
    .bind(sale.payment_state)
    .bind(sale.amount_paid_cents)
    .bind(sale.pending_cents)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a sale line.
///
/// ## Snapshot Pattern
/// The unit price is copied onto the line, so later price changes on the
/// product never rewrite sale history.
pub async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    debug!(sale_id = %line.sale_id, product_id = %line.product_id, "Adding sale line");

    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, business_id, product_id, position,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.business_id)
    .bind(&line.product_id)
    .bind(line.position)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.subtotal_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
