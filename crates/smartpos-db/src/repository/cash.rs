//! # Cash Session Repository
//!
//! The cash drawer ledger. A sale never opens or closes a session; it only
//! finds the cashier's OPEN one and appends a movement to it.
//!
//! ```text
//! cash_sessions (one OPEN per business + cashier)
//!      │ 1
//!      │
//!      │ n
//! cash_movements (append-only: SALE, INCOME, EXPENSE)
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbResult;
use smartpos_core::{CashMovement, CashSession, CashSessionStatus, Money};

const SESSION_COLUMNS: &str = "id, business_id, user_id, status, opening_cents, opened_at, closed_at";

const MOVEMENT_COLUMNS: &str = "id, session_id, business_id, user_id, kind, payment_method, \
                                amount_cents, description, sale_id, created_at";

/// Repository for cash session database operations.
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    /// Opens a drawer for a cashier.
    ///
    /// Fails with a unique violation if the cashier already has an OPEN
    /// session in this business.
    pub async fn open_session(
        &self,
        business_id: &str,
        user_id: &str,
        opening: Money,
    ) -> DbResult<CashSession> {
        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            user_id: user_id.to_string(),
            status: CashSessionStatus::Open,
            opening_cents: opening.cents(),
            opened_at: Utc::now(),
            closed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, business_id, user_id, status, opening_cents, opened_at, closed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.business_id)
        .bind(&session.user_id)
        .bind(session.status)
        .bind(session.opening_cents)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %session.id, user_id = %user_id, "Cash session opened");
        Ok(session)
    }

    /// Lists the movements of a session in insertion order.
    pub async fn movements_for_session(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let sql = format!(
            "SELECT {} FROM cash_movements WHERE session_id = ? ORDER BY created_at, rowid",
            MOVEMENT_COLUMNS
        );

        let movements = sqlx::query_as::<_, CashMovement>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Lists the movements posted for a sale.
    pub async fn movements_for_sale(&self, sale_id: &str) -> DbResult<Vec<CashMovement>> {
        let sql = format!(
            "SELECT {} FROM cash_movements WHERE sale_id = ? ORDER BY created_at, rowid",
            MOVEMENT_COLUMNS
        );

        let movements = sqlx::query_as::<_, CashMovement>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Finds the OPEN session of a cashier in a business.
///
/// More than one OPEN row can only come from data written before the
/// unique index existed. The most recently opened one wins.
pub async fn find_open_session(
    conn: &mut SqliteConnection,
    business_id: &str,
    user_id: &str,
) -> DbResult<Option<CashSession>> {
    let sql = format!(
        "SELECT {} FROM cash_sessions \
         WHERE business_id = ? AND user_id = ? AND status = 'OPEN' \
         ORDER BY opened_at DESC",
        SESSION_COLUMNS
    );

    let mut sessions = sqlx::query_as::<_, CashSession>(&sql)
        .bind(business_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    if sessions.len() > 1 {
        warn!(
            business_id = %business_id,
            user_id = %user_id,
            open_sessions = sessions.len(),
            "Multiple open cash sessions, using the newest"
        );
    }

    Ok(if sessions.is_empty() {
        None
    } else {
        Some(sessions.swap_remove(0))
    })
}

/// Appends a movement to a session.
pub async fn insert_movement(conn: &mut SqliteConnection, movement: &CashMovement) -> DbResult<()> {
    debug!(
        session_id = %movement.session_id,
        amount_cents = movement.amount_cents,
        "Posting cash movement"
    );

    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, session_id, business_id, user_id, kind,
            payment_method, amount_cents, description, sale_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.session_id)
    .bind(&movement.business_id)
    .bind(&movement.user_id)
    .bind(movement.kind)
    .bind(&movement.payment_method)
    .bind(movement.amount_cents)
    .bind(&movement.description)
    .bind(&movement.sale_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
