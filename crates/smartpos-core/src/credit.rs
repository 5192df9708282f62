//! # Credit Policy
//!
//! Decides whether a customer can take on a new debt, and when that debt
//! falls due.
//!
//! ```text
//! available = credit_limit - outstanding
//! approved  = available >= requested
//! due_date  = created_at + credit_days   (unset or 0 → default term)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Credit term used when a customer has none configured.
pub const DEFAULT_CREDIT_DAYS: i64 = 30;

/// Outcome of a credit evaluation. Read-only; nothing is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditCheck {
    pub approved: bool,
    pub available: Money,
    pub limit: Money,
    pub outstanding: Money,
    pub requested: Money,
}

impl CreditCheck {
    /// Evaluates a request against a limit and the current balance.
    ///
    /// ## Example
    /// ```rust
    /// use smartpos_core::{CreditCheck, Money};
    ///
    /// let check = CreditCheck::evaluate(
    ///     Money::from_cents(10_000),
    ///     Money::from_cents(8_000),
    ///     Money::from_cents(2_500),
    /// );
    /// assert!(!check.approved);
    /// assert_eq!(check.available.cents(), 2_000);
    /// ```
    pub fn evaluate(limit: Money, outstanding: Money, requested: Money) -> Self {
        let available = limit - outstanding;
        CreditCheck {
            approved: available >= requested,
            available,
            limit,
            outstanding,
            requested,
        }
    }

    /// Turns a rejected check into [`CoreError::InsufficientCredit`].
    pub fn ensure_approved(&self) -> CoreResult<()> {
        if self.approved {
            Ok(())
        } else {
            Err(CoreError::InsufficientCredit {
                available: self.available,
                requested: self.requested,
            })
        }
    }
}

/// Effective credit term in days.
///
/// A missing or non-positive term falls back to `default_days`.
pub fn credit_term_days(customer_days: Option<i64>, default_days: i64) -> i64 {
    match customer_days {
        Some(days) if days > 0 => days,
        _ => default_days,
    }
}

/// Due date of a debt created at `created_at`.
pub fn due_date(created_at: DateTime<Utc>, customer_days: Option<i64>, default_days: i64) -> DateTime<Utc> {
    created_at + Duration::days(credit_term_days(customer_days, default_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_evaluate_insufficient() {
        let check = CreditCheck::evaluate(
            Money::from_cents(10_000),
            Money::from_cents(8_000),
            Money::from_cents(2_500),
        );
        assert!(!check.approved);
        assert!(matches!(
            check.ensure_approved(),
            Err(CoreError::InsufficientCredit { available, requested })
                if available.cents() == 2_000 && requested.cents() == 2_500
        ));
    }

    #[test]
    fn test_evaluate_exact_headroom_is_approved() {
        let check = CreditCheck::evaluate(
            Money::from_cents(10_000),
            Money::from_cents(7_500),
            Money::from_cents(2_500),
        );
        assert!(check.approved);
        assert!(check.ensure_approved().is_ok());
    }

    #[test]
    fn test_evaluate_limit_below_balance() {
        let check = CreditCheck::evaluate(Money::zero(), Money::from_cents(100), Money::from_cents(1));
        assert_eq!(check.available.cents(), -100);
        assert!(!check.approved);
    }

    #[test]
    fn test_credit_term_defaults() {
        assert_eq!(credit_term_days(None, DEFAULT_CREDIT_DAYS), 30);
        assert_eq!(credit_term_days(Some(0), DEFAULT_CREDIT_DAYS), 30);
        assert_eq!(credit_term_days(Some(15), DEFAULT_CREDIT_DAYS), 15);
    }

    #[test]
    fn test_due_date() {
        let created = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(
            due_date(created, None, DEFAULT_CREDIT_DAYS),
            Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
        );
        assert_eq!(
            due_date(created, Some(7), DEFAULT_CREDIT_DAYS),
            Utc.with_ymd_and_hms(2025, 2, 7, 12, 0, 0).unwrap()
        );
    }
}
