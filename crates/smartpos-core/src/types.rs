//! # Domain Types
//!
//! Core domain types used throughout the SmartPOS sale engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Business (tenant) ── every row below carries business_id              │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                │
//! │  │   Product    │   │   Customer   │   │     User     │                │
//! │  │  price_cents │   │ credit_limit │   │  (cashier)   │                │
//! │  │  stock       │   │ debt_balance │   │ auth_user_id │                │
//! │  └──────┬───────┘   │ points       │   └──────┬───────┘                │
//! │         │           └──────┬───────┘          │                        │
//! │         ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐   ┌──────────────────────────────┐                   │
//! │  │   SaleLine   │◄──│            Sale              │                   │
//! │  │ unit_price   │   │ total, paid, pending, state  │                   │
//! │  │ (snapshot)   │   └──────┬──────────────┬────────┘                   │
//! │  └──────────────┘          │ 0..1         │ 0..1                       │
//! │                            ▼              ▼                            │
//! │                     ┌────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │                     │    Debt    │  │ CashMovement │─►│ CashSession │  │
//! │                     │ due_date   │  │ kind = SALE  │  │ OPEN/CLOSED │  │
//! │                     └────────────┘  └──────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as `*_cents: i64` and exposed as [`Money`]
//! through accessor methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_PAYMENT_METHOD;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business this product belongs to.
    pub business_id: String,

    /// Optional stock keeping unit.
    pub sku: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit cost in cents.
    pub cost_cents: i64,

    /// Unit sale price in cents.
    pub price_cents: i64,

    /// Current stock level. Can go negative under the default policy.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Bumped on every mutation.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Label used in stock errors: the SKU when present, otherwise the name.
    pub fn label(&self) -> &str {
        self.sku.as_deref().unwrap_or(&self.name)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer of a business, optionally buying on store credit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: Option<String>,
    /// National id number (cédula). Unique per business when present.
    pub national_id: Option<String>,
    /// Unique per business when present.
    pub email: Option<String>,
    pub address: Option<String>,
    /// Maximum outstanding debt allowed, in cents.
    pub credit_limit_cents: i64,
    /// Days until a new debt falls due. `None` means the default term.
    pub credit_days: Option<i64>,
    /// Outstanding debt, maintained incrementally (saldoDeuda).
    pub debt_balance_cents: i64,
    /// Accrued loyalty points.
    pub points: i64,
    pub is_active: bool,
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents)
    }

    #[inline]
    pub fn debt_balance(&self) -> Money {
        Money::from_cents(self.debt_balance_cents)
    }
}

/// Data for registering a customer inline during a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Defaults to 0 (no credit) when absent.
    pub credit_limit_cents: Option<i64>,
    /// Defaults to the standard term when absent or zero.
    pub credit_days: Option<i64>,
}

impl NewCustomer {
    /// Trims text fields and turns empty strings into `None`.
    ///
    /// Empty national ids and emails must become NULL, otherwise the
    /// per-business unique indexes reject the second customer without one.
    pub fn normalized(mut self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        self.name = self.name.trim().to_string();
        self.phone = clean(self.phone);
        self.national_id = clean(self.national_id);
        self.email = clean(self.email);
        self.address = clean(self.address);
        self
    }
}

// =============================================================================
// User (Cashier)
// =============================================================================

/// A local user record, linked to the identity provider by `auth_user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub business_id: String,
    pub auth_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_active: bool,
}

/// The slice of a user shown on a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cashier {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Payment State & Method
// =============================================================================

/// How a sale is settled.
///
/// ## Wire Names
/// The HTTP API speaks the store's own vocabulary (`PAGADO`, `FIADO`,
/// `PARCIAL`); the English names are accepted as aliases. The database
/// stores the English uppercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
pub enum PaymentState {
    /// Fully paid at the till. Amount paid is forced to the total.
    #[default]
    #[serde(rename = "PAGADO", alias = "PAID")]
    Paid,
    /// On store credit. Creates a debt when a customer is attached.
    #[serde(rename = "FIADO", alias = "CREDIT")]
    Credit,
    /// Partly paid, remainder pending without a debt record.
    #[serde(rename = "PARCIAL", alias = "PARTIAL")]
    Partial,
}

/// Free-form payment method label ("EFECTIVO", "tarjeta", "TRANSFERENCIA").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    pub fn new(method: impl Into<String>) -> Self {
        PaymentMethod(method.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercase tag written on cash movements.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::new("tarjeta").tag(), "TARJETA");
    /// ```
    pub fn tag(&self) -> String {
        self.0.to_uppercase()
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod(DEFAULT_PAYMENT_METHOD.to_string())
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header. Created once by the engine, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub business_id: String,
    pub customer_id: Option<String>,
    /// Cashier who rang up the sale.
    pub user_id: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_state: PaymentState,
    pub amount_paid_cents: i64,
    pub pending_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    #[inline]
    pub fn pending(&self) -> Money {
        Money::from_cents(self.pending_cents)
    }
}

/// A line of a sale. Uses the snapshot pattern: the unit price is frozen at
/// sale time and never follows later product price changes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub business_id: String,
    pub product_id: String,
    /// Zero-based index in the original cart.
    pub position: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub subtotal_cents: i64,
}

impl SaleLine {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Debt
// =============================================================================

/// Lifecycle of a receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DebtStatus {
    #[default]
    Pending,
    Overdue,
    Paid,
}

/// Store-credit receivable created by a credit sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Debt {
    pub id: String,
    pub business_id: String,
    /// At most one debt per sale.
    pub sale_id: String,
    pub customer_id: String,
    pub total_cents: i64,
    /// Remaining balance. Starts equal to the total.
    pub balance_cents: i64,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub status: DebtStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A payment applied to a debt (abono). Read-only for the sale engine.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DebtPayment {
    pub id: String,
    pub debt_id: String,
    pub amount_cents: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum CashSessionStatus {
    Open,
    Closed,
}

/// A cashier's drawer period (caja).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub business_id: String,
    pub user_id: String,
    pub status: CashSessionStatus,
    pub opening_cents: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum CashMovementKind {
    /// Payment taken for a sale.
    Sale,
    /// Manual cash in.
    Income,
    /// Manual cash out.
    Expense,
}

/// Append-only drawer ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub business_id: String,
    pub user_id: String,
    pub kind: CashMovementKind,
    /// Uppercase payment method tag.
    pub payment_method: String,
    pub amount_cents: i64,
    pub description: String,
    pub sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Request & Read Model
// =============================================================================

/// One cart entry as sent by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Everything the engine needs to create a sale.
///
/// `business_id` and `user_id` come from the authenticated request, never
/// from the body.
#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub business_id: String,
    pub user_id: String,
    pub customer_id: Option<String>,
    pub items: Vec<CartItem>,
    pub payment_method: PaymentMethod,
    pub payment_state: PaymentState,
    /// Ignored for `Paid` sales, where the total is taken.
    pub amount_paid_cents: i64,
    /// Register this customer first and attach the sale to them.
    pub new_customer: Option<NewCustomer>,
}

/// A sale line joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineDetail {
    #[serde(flatten)]
    pub line: SaleLine,
    pub product: Product,
}

/// A debt joined with its payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtDetail {
    #[serde(flatten)]
    pub debt: Debt,
    pub payments: Vec<DebtPayment>,
}

/// Fully materialized sale, as returned after creation and by lookups.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLineDetail>,
    pub customer: Option<Customer>,
    pub cashier: Option<Cashier>,
    pub debt: Option<DebtDetail>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_state_wire_names() {
        let state: PaymentState = serde_json::from_str("\"FIADO\"").unwrap();
        assert_eq!(state, PaymentState::Credit);

        let state: PaymentState = serde_json::from_str("\"CREDIT\"").unwrap();
        assert_eq!(state, PaymentState::Credit);

        assert_eq!(
            serde_json::to_string(&PaymentState::Paid).unwrap(),
            "\"PAGADO\""
        );
        assert!(serde_json::from_str::<PaymentState>("\"GRATIS\"").is_err());
    }

    #[test]
    fn test_payment_state_default_is_paid() {
        assert_eq!(PaymentState::default(), PaymentState::Paid);
    }

    #[test]
    fn test_payment_method_tag() {
        assert_eq!(PaymentMethod::default().as_str(), "EFECTIVO");
        assert_eq!(PaymentMethod::new("  tarjeta ").as_str(), "tarjeta");
        assert_eq!(PaymentMethod::new("tarjeta").tag(), "TARJETA");
    }

    #[test]
    fn test_new_customer_normalized_blanks_become_none() {
        let customer = NewCustomer {
            name: "  Ana  ".into(),
            national_id: Some("".into()),
            email: Some("   ".into()),
            phone: Some("0991".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.national_id, None);
        assert_eq!(customer.email, None);
        assert_eq!(customer.phone.as_deref(), Some("0991"));
    }

    #[test]
    fn test_debt_status_serialization() {
        assert_eq!(
            serde_json::to_string(&DebtStatus::Pending).unwrap(),
            "\"PENDING\""
        );
    }
}
