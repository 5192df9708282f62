//! # Sale Service
//!
//! The transaction boundary of the sale engine.
//!
//! ## create_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (no I/O)                                              │
//! │       │                                                                 │
//! │  BEGIN IMMEDIATE ───────────────────────────────────────────────────┐  │
//! │  │ 1. inline customer   insert, or resolve customer_id in business │  │
//! │  │ 3. pricing           load products, price_cart, settle          │  │
//! │  │ 2. credit check      CREDIT + customer: limit - balance >= total│  │
//! │  │ 4. header            insert sale                                │  │
//! │  │ 5. lines + stock     insert line, stock -= qty (per line)       │  │
//! │  │ 6. debt              CREDIT + customer: debt row, balance += ..  │  │
//! │  │ 7. loyalty           PAID + customer: points += total / unit    │  │
//! │  │ 8. cash movement     paid > 0: OPEN session → SALE movement     │  │
//! │  │                      no session → warn, sale still completes    │  │
//! │  COMMIT ────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │  9. read back outside the transaction                                  │
//! │       └── failure → SaleError::CreatedButUnreadable                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit opens with `BEGIN IMMEDIATE`, so concurrent sales queue on the
//! write lock for up to `busy_timeout` instead of failing on upgrade.
//!
//! Pricing runs ahead of the credit check. It is pure apart from the
//! product read, and it yields the exact total that is checked and then
//! persisted. Any `?` between BEGIN and COMMIT drops the transaction,
//! which rolls every write back.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{cash, customer, debt, product, sale};
use crate::repository::customer::CustomerRepository;
use crate::repository::sale::SaleRepository;
use smartpos_core::cart::{self, PricedCart, Settlement};
use smartpos_core::credit::{self, CreditCheck};
use smartpos_core::loyalty;
use smartpos_core::validation::{validate_new_customer, validate_payment_method};
use smartpos_core::{
    CashMovement, CashMovementKind, CoreError, Customer, Debt, DebtStatus, Money, PaymentState,
    Sale, SaleDetail, SaleLine, SalePolicy, SaleRequest, ValidationError,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors from the sale engine.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Business rule rejected the request. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failed. Inside the transaction this means full rollback.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The sale committed, but reading it back failed.
    ///
    /// ## When This Occurs
    /// - The store went away between COMMIT and the read
    /// - A row referenced by the sale could not be decoded
    ///
    /// The sale exists. Callers must not retry it blindly.
    #[error("Sale {sale_id} was created but could not be read back: {reason}")]
    CreatedButUnreadable { sale_id: String, reason: String },
}

impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::Core(CoreError::Validation(err))
    }
}

/// Result type for sale operations.
pub type SaleResult<T> = Result<T, SaleError>;

// =============================================================================
// Service
// =============================================================================

/// Creates and reads sales.
///
/// ## Usage
/// ```rust,ignore
/// let service = db.sales_service(SalePolicy::default());
/// let detail = service.create_sale(request).await?;
/// assert_eq!(detail.lines.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SaleService {
    pool: SqlitePool,
    policy: SalePolicy,
}

impl SaleService {
    pub fn new(pool: SqlitePool, policy: SalePolicy) -> Self {
        SaleService { pool, policy }
    }

    /// Creates a sale atomically and returns it fully joined.
    ///
    /// ## Errors
    /// - `Core(Validation | EmptyCart | CartTooLarge | InvalidPaymentAmount)` - bad request
    /// - `Core(ProductNotFound | CustomerNotFound)` - reference outside the business
    /// - `Core(InsufficientCredit | InsufficientStock)` - policy said no
    /// - `Db(Conflict)` - lost a race on credit or stock, retryable
    /// - `CreatedButUnreadable` - committed, read-back failed
    pub async fn create_sale(&self, request: SaleRequest) -> SaleResult<SaleDetail> {
        cart::validate_items(&request.items)?;
        validate_payment_method(&request.payment_method)?;

        let new_customer = request.new_customer.clone().map(|c| c.normalized());
        if let Some(data) = &new_customer {
            validate_new_customer(data)?;
        }

        let created_at = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        // Write lock up front: a deferred upgrade fails with BUSY_SNAPSHOT
        // instead of waiting on busy_timeout
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::from)?;

        // 1. Customer: inline registration wins over an explicit id
        let customer = match (new_customer, &request.customer_id) {
            (Some(data), _) => {
                let created = customer::customer_from_new(&request.business_id, data, created_at);
                customer::insert_customer(&mut *tx, &created).await?;
                info!(customer_id = %created.id, "Registered customer inline");
                Some(created)
            }
            (None, Some(customer_id)) => Some(
                customer::find_in_business(&mut *tx, &request.business_id, customer_id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?,
            ),
            (None, None) => None,
        };

        // 3. Pricing, once, before anything is checked against the total
        let priced = self.price(&mut *tx, &request).await?;
        let settlement = cart::settle(
            priced.total,
            request.payment_state,
            Money::from_cents(request.amount_paid_cents),
        )?;

        // 2. Credit check against the same total
        if request.payment_state == PaymentState::Credit {
            match &customer {
                Some(c) => {
                    CreditCheck::evaluate(c.credit_limit(), c.debt_balance(), priced.total)
                        .ensure_approved()?;
                }
                None => warn!(
                    sale_id = %sale_id,
                    pending = %settlement.pending,
                    "Credit sale without customer, no debt will be recorded"
                ),
            }
        }

        // 4. Header
        let header = Sale {
            id: sale_id.clone(),
            business_id: request.business_id.clone(),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            user_id: request.user_id.clone(),
            total_cents: priced.total.cents(),
            payment_method: request.payment_method.clone(),
            payment_state: request.payment_state,
            amount_paid_cents: settlement.amount_paid.cents(),
            pending_cents: settlement.pending.cents(),
            created_at,
        };
        sale::insert_sale(&mut *tx, &header).await?;

        // 5. Lines and stock
        for line in &priced.lines {
            let row = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                business_id: request.business_id.clone(),
                product_id: line.product_id.clone(),
                position: line.position as i64,
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal.cents(),
            };
            sale::insert_line(&mut *tx, &row).await?;
            product::decrement_stock(
                &mut *tx,
                &request.business_id,
                &line.product_id,
                line.quantity,
                self.policy.allow_negative_stock,
            )
            .await?;
        }

        if let Some(c) = &customer {
            // 6. Debt
            if request.payment_state == PaymentState::Credit {
                self.record_debt(&mut *tx, &header, c, priced.total, settlement, created_at)
                    .await?;
            }

            // 7. Loyalty
            let points = loyalty::accrual(
                request.payment_state,
                true,
                priced.total,
                self.policy.loyalty_unit(),
            );
            if points > 0 {
                customer::add_points(&mut *tx, &request.business_id, &c.id, points).await?;
            }
        }

        // 8. Cash movement
        if settlement.amount_paid.is_positive() {
            self.post_cash_movement(&mut *tx, &header, created_at).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale_id,
            business_id = %request.business_id,
            total = %priced.total,
            state = ?request.payment_state,
            lines = priced.lines.len(),
            "Sale committed"
        );

        // 9. Read back
        match self.sales().get_detail(&request.business_id, &sale_id).await {
            Ok(Some(detail)) => Ok(detail),
            Ok(None) => Err(SaleError::CreatedButUnreadable {
                sale_id,
                reason: "sale not visible after commit".to_string(),
            }),
            Err(e) => Err(SaleError::CreatedButUnreadable {
                sale_id,
                reason: e.to_string(),
            }),
        }
    }

    /// Gets one sale of a business, fully joined.
    pub async fn get_sale(&self, business_id: &str, sale_id: &str) -> SaleResult<SaleDetail> {
        self.sales()
            .get_detail(business_id, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Lists sale headers of a business, newest first.
    pub async fn list_sales(&self, business_id: &str) -> SaleResult<Vec<Sale>> {
        Ok(self.sales().list(business_id).await?)
    }

    /// Evaluates whether a customer can take `amount` more on credit.
    ///
    /// Read-only. Nothing is reserved.
    pub async fn check_credit(
        &self,
        business_id: &str,
        customer_id: &str,
        amount: Money,
    ) -> SaleResult<CreditCheck> {
        if amount.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "amount".to_string(),
            }
            .into());
        }

        let customer = self
            .customers()
            .get_by_id(business_id, customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

        Ok(CreditCheck::evaluate(
            customer.credit_limit(),
            customer.debt_balance(),
            amount,
        ))
    }

    // =========================================================================
    // Steps
    // =========================================================================

    async fn price(
        &self,
        conn: &mut SqliteConnection,
        request: &SaleRequest,
    ) -> SaleResult<PricedCart> {
        let mut ids: Vec<&str> = request.items.iter().map(|i| i.product_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut products = product::find_many(&mut *conn, &request.business_id, &ids).await?;
        products.retain(|_, p| p.is_active);

        Ok(cart::price_cart(
            &request.items,
            &products,
            self.policy.allow_negative_stock,
        )?)
    }

    async fn record_debt(
        &self,
        conn: &mut SqliteConnection,
        header: &Sale,
        customer: &Customer,
        checked_total: Money,
        settlement: Settlement,
        created_at: DateTime<Utc>,
    ) -> SaleResult<()> {
        let due_date = credit::due_date(
            created_at,
            customer.credit_days,
            self.policy.default_credit_days,
        );

        let row = Debt {
            id: Uuid::new_v4().to_string(),
            business_id: header.business_id.clone(),
            sale_id: header.id.clone(),
            customer_id: customer.id.clone(),
            total_cents: settlement.pending.cents(),
            balance_cents: settlement.pending.cents(),
            due_date,
            status: DebtStatus::Pending,
            created_at,
        };
        debt::insert_debt(&mut *conn, &row).await?;

        customer::increment_debt_balance(
            &mut *conn,
            &header.business_id,
            &customer.id,
            settlement.pending,
            checked_total,
        )
        .await?;

        Ok(())
    }

    async fn post_cash_movement(
        &self,
        conn: &mut SqliteConnection,
        header: &Sale,
        created_at: DateTime<Utc>,
    ) -> SaleResult<()> {
        let session = cash::find_open_session(&mut *conn, &header.business_id, &header.user_id).await?;

        let Some(session) = session else {
            warn!(
                sale_id = %header.id,
                user_id = %header.user_id,
                amount = %header.amount_paid(),
                "No open cash session, sale recorded without cash movement"
            );
            return Ok(());
        };

        let tag = header.payment_method.tag();
        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            session_id: session.id,
            business_id: header.business_id.clone(),
            user_id: header.user_id.clone(),
            kind: CashMovementKind::Sale,
            description: format!("Sale #{} ({})", header.id, tag),
            payment_method: tag,
            amount_cents: header.amount_paid_cents,
            sale_id: Some(header.id.clone()),
            created_at,
        };
        cash::insert_movement(&mut *conn, &movement).await?;

        Ok(())
    }

    fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }
}
