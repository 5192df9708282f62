//! # Debt Repository
//!
//! Store-credit receivables. A credit sale writes exactly one debt; payments
//! against it (abonos) are recorded by other flows and only read here, as
//! part of the sale read model.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use smartpos_core::{Debt, DebtDetail, DebtPayment};

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Inserts a debt. `debts.sale_id` is unique, so a second debt for the
/// same sale fails with a unique violation.
pub async fn insert_debt(conn: &mut SqliteConnection, debt: &Debt) -> DbResult<()> {
    debug!(
        id = %debt.id,
        sale_id = %debt.sale_id,
        customer_id = %debt.customer_id,
        total_cents = debt.total_cents,
        "Inserting debt"
    );

    sqlx::query(
        r#"
        INSERT INTO debts (
            id, business_id, sale_id, customer_id,
            total_cents, balance_cents, due_date, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&debt.id)
    .bind(&debt.business_id)
    .bind(&debt.sale_id)
    .bind(&debt.customer_id)
    .bind(debt.total_cents)
    .bind(debt.balance_cents)
    .bind(debt.due_date)
    .bind(debt.status)
    .bind(debt.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Loads a sale's debt together with its payments.
pub async fn find_detail_by_sale(
    pool: &SqlitePool,
    business_id: &str,
    sale_id: &str,
) -> DbResult<Option<DebtDetail>> {
    let debt = sqlx::query_as::<_, Debt>(
        r#"
        SELECT id, business_id, sale_id, customer_id, total_cents,
               balance_cents, due_date, status, created_at
        FROM debts
        WHERE sale_id = ? AND business_id = ?
        "#,
    )
    .bind(sale_id)
    .bind(business_id)
    .fetch_optional(pool)
    .await?;

    let Some(debt) = debt else {
        return Ok(None);
    };

    let payments = sqlx::query_as::<_, DebtPayment>(
        r#"
        SELECT id, debt_id, amount_cents, note, created_at
        FROM debt_payments
        WHERE debt_id = ?
        ORDER BY created_at
        "#,
    )
    .bind(&debt.id)
    .fetch_all(pool)
    .await?;

    Ok(Some(DebtDetail { debt, payments }))
}
