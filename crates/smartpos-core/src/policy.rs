//! # Sale Policy
//!
//! Per-deployment knobs for the sale engine. Deserializes straight from the
//! `[sales]` table of the server config.
//!
//! ```toml
//! [sales]
//! allow_negative_stock = true
//! default_credit_days = 30
//! loyalty_unit_cents = 100000
//! ```

use serde::{Deserialize, Serialize};

use crate::credit::DEFAULT_CREDIT_DAYS;
use crate::loyalty::DEFAULT_POINTS_UNIT;
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePolicy {
    /// Sell past zero stock. On by default.
    #[serde(default = "default_allow_negative_stock")]
    pub allow_negative_stock: bool,

    /// Credit term for customers with none configured.
    #[serde(default = "default_credit_days")]
    pub default_credit_days: i64,

    /// Spend in cents that earns one loyalty point.
    #[serde(default = "default_loyalty_unit")]
    pub loyalty_unit_cents: i64,
}

fn default_allow_negative_stock() -> bool {
    true
}

fn default_credit_days() -> i64 {
    DEFAULT_CREDIT_DAYS
}

fn default_loyalty_unit() -> i64 {
    DEFAULT_POINTS_UNIT.cents()
}

impl Default for SalePolicy {
    fn default() -> Self {
        SalePolicy {
            allow_negative_stock: default_allow_negative_stock(),
            default_credit_days: default_credit_days(),
            loyalty_unit_cents: default_loyalty_unit(),
        }
    }
}

impl SalePolicy {
    pub fn loyalty_unit(&self) -> Money {
        Money::from_cents(self.loyalty_unit_cents)
    }

    /// Builder-style toggle, handy in tests.
    pub fn with_negative_stock(mut self, allow: bool) -> Self {
        self.allow_negative_stock = allow;
        self
    }

    pub fn with_loyalty_unit(mut self, unit: Money) -> Self {
        self.loyalty_unit_cents = unit.cents();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = SalePolicy::default();
        assert!(policy.allow_negative_stock);
        assert_eq!(policy.default_credit_days, 30);
        assert_eq!(policy.loyalty_unit().cents(), 100_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let policy: SalePolicy =
            serde_json::from_str(r#"{"allow_negative_stock": false}"#).unwrap();
        assert!(!policy.allow_negative_stock);
        assert_eq!(policy.default_credit_days, 30);
    }
}
