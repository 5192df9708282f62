//! # Customer Repository
//!
//! Customer lookups plus the two aggregate counters a sale moves:
//! the outstanding debt balance and loyalty points.
//!
//! ## Credit Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check (read)            act (write, same transaction)                  │
//! │  ─────────────           ───────────────────────────────────────────    │
//! │  limit - balance         UPDATE customers                               │
//! │     >= total ?           SET debt_balance_cents += pending,             │
//! │                              version = version + 1                      │
//! │                          WHERE id = ? AND business_id = ?               │
//! │                            AND credit_limit_cents                       │
//! │                                - debt_balance_cents >= total            │
//! │                                                                         │
//! │  0 rows → another sale used the headroom first → DbError::Conflict      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use smartpos_core::{Customer, Money, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, business_id, name, phone, national_id, email, address, \
                                credit_limit_cents, credit_days, debt_balance_cents, points, \
                                is_active, version, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Customer>> {
        find_in_business(&self.pool, business_id, id).await
    }

    /// Inserts a customer outside of any sale.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_customer(&mut conn, customer).await
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Looks up a customer within a business.
pub async fn find_in_business<'e, E>(
    executor: E,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Customer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM customers WHERE id = ? AND business_id = ?",
        CUSTOMER_COLUMNS
    );

    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;

    Ok(customer)
}

/// Builds a customer row from inline registration data.
///
/// Credit limit defaults to zero. A missing credit term stays `None`,
/// which reads as the default term everywhere.
pub fn customer_from_new(business_id: &str, data: NewCustomer, now: DateTime<Utc>) -> Customer {
    Customer {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: data.name,
        phone: data.phone,
        national_id: data.national_id,
        email: data.email,
        address: data.address,
        credit_limit_cents: data.credit_limit_cents.unwrap_or(0),
        credit_days: data.credit_days.filter(|days| *days > 0),
        debt_balance_cents: 0,
        points: 0,
        is_active: true,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Inserts a customer row.
///
/// A duplicate national id or email within the business comes back as
/// `DbError::UniqueViolation` naming the field.
pub async fn insert_customer(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    debug!(id = %customer.id, name = %customer.name, "Inserting customer");

    sqlx::query(
        r#"
        INSERT INTO customers (
            id, business_id, name, phone, national_id, email, address,
            credit_limit_cents, credit_days, debt_balance_cents, points,
            is_active, version, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.business_id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.national_id)
    .bind(&customer.email)
    .bind(&customer.address)
    .bind(customer.credit_limit_cents)
    .bind(customer.credit_days)
    .bind(customer.debt_balance_cents)
    .bind(customer.points)
    .bind(customer.is_active)
    .bind(customer.version)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } if field.ends_with("national_id") => {
            DbError::duplicate("national id", customer.national_id.clone().unwrap_or_default())
        }
        DbError::UniqueViolation { field, .. } if field.ends_with("email") => {
            DbError::duplicate("email", customer.email.clone().unwrap_or_default())
        }
        other => other,
    })?;

    Ok(())
}

/// Adds `amount` to the customer's outstanding debt, guarded on headroom.
///
/// The write only lands while `limit - balance >= checked_total`, the same
/// condition the credit check approved. Losing that race is a conflict.
pub async fn increment_debt_balance(
    conn: &mut SqliteConnection,
    business_id: &str,
    customer_id: &str,
    amount: Money,
    checked_total: Money,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE customers SET
            debt_balance_cents = debt_balance_cents + ?,
            version = version + 1,
            updated_at = ?
        WHERE id = ? AND business_id = ?
          AND credit_limit_cents - debt_balance_cents >= ?
        "#,
    )
    .bind(amount.cents())
    .bind(Utc::now())
    .bind(customer_id)
    .bind(business_id)
    .bind(checked_total.cents())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict(format!(
            "credit headroom of customer {} changed during the sale",
            customer_id
        )));
    }

    debug!(customer_id = %customer_id, amount = %amount, "Debt balance incremented");
    Ok(())
}

/// Adds loyalty points to a customer.
pub async fn add_points(
    conn: &mut SqliteConnection,
    business_id: &str,
    customer_id: &str,
    points: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE customers SET
            points = points + ?,
            version = version + 1,
            updated_at = ?
        WHERE id = ? AND business_id = ?
        "#,
    )
    .bind(points)
    .bind(Utc::now())
    .bind(customer_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    debug!(customer_id = %customer_id, points, "Loyalty points added");
    Ok(())
}
