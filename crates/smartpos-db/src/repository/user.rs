//! # User Repository
//!
//! Businesses and their users. User rows are created by the identity
//! provider's provisioning trigger, usually a moment after sign-up, which
//! is why the server looks them up with a bounded retry.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use smartpos_core::{Cashier, User};

/// Repository for business and user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Finds the local user linked to an identity provider subject.
    pub async fn find_by_auth_id(&self, auth_user_id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, business_id, auth_user_id, name, email, is_active
            FROM users
            WHERE auth_user_id = ?
            "#,
        )
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a user.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, business_id = %user.business_id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, business_id, auth_user_id, name, email, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.business_id)
        .bind(&user.auth_user_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a business (tenant).
    pub async fn insert_business(&self, id: &str, name: &str) -> DbResult<()> {
        debug!(id = %id, name = %name, "Inserting business");

        sqlx::query("INSERT INTO businesses (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Loads the cashier shown on a sale.
pub async fn find_cashier(pool: &SqlitePool, user_id: &str) -> DbResult<Option<Cashier>> {
    let cashier = sqlx::query_as::<_, Cashier>("SELECT id, name FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(cashier)
}
