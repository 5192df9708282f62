//! # Cart Pricing
//!
//! Turns a cart of `{product_id, quantity}` into priced lines and a total,
//! and splits that total into paid and pending amounts.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleService::create_sale (inside the transaction)                      │
//! │                                                                         │
//! │  validate_items(cart)          ← shape only, nothing read yet          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load products (business scoped)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_cart(cart, products)    ← freezes unit prices, sums total       │
//! │       │                                                                 │
//! │       ├──► credit check uses priced.total                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  settle(total, state, paid)    ← amount paid / pending                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing runs once. The same `PricedCart` feeds both the credit check
//! and the persisted rows, so the checked total is the persisted total.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartItem, PaymentState, Product};
use crate::validation::{validate_id, validate_quantity};
use crate::MAX_CART_ITEMS;

/// One cart line with its frozen price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    /// Index in the original cart.
    pub position: usize,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A fully priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    /// Exactly the sum of line subtotals.
    pub total: Money,
}

impl PricedCart {
    /// Total quantity requested per product across all lines.
    pub fn quantity_by_product(&self) -> HashMap<&str, i64> {
        let mut totals: HashMap<&str, i64> = HashMap::new();
        for line in &self.lines {
            let total = totals.entry(line.product_id.as_str()).or_default();
            *total = total.saturating_add(line.quantity);
        }
        totals
    }
}

/// Amount paid now and amount left pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub amount_paid: Money,
    pub pending: Money,
}

/// Checks cart shape before anything is read or written.
///
/// ## Rules
/// - At least one line
/// - At most [`MAX_CART_ITEMS`] lines
/// - Every line names a product and has a positive quantity
pub fn validate_items(items: &[CartItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if items.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    for item in items {
        validate_id("product_id", &item.product_id)?;
        validate_quantity(item.quantity)?;
    }

    Ok(())
}

/// Prices every cart line from the given products.
///
/// `products` must hold only rows already scoped to the caller's business;
/// any id missing from it is reported as [`CoreError::ProductNotFound`].
///
/// When `allow_negative_stock` is false, the summed quantity per product
/// is checked against current stock.
///
/// ## Example
/// ```rust,ignore
/// let priced = price_cart(&items, &products, true)?;
/// assert_eq!(priced.total, priced.lines.iter().map(|l| l.subtotal).sum());
/// ```
pub fn price_cart(
    items: &[CartItem],
    products: &HashMap<String, Product>,
    allow_negative_stock: bool,
) -> CoreResult<PricedCart> {
    let mut lines = Vec::with_capacity(items.len());
    let mut total = Money::zero();

    for (position, item) in items.iter().enumerate() {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

        let unit_price = product.price();
        let subtotal = unit_price
            .multiply_quantity(item.quantity)
            .ok_or_else(|| too_large("line subtotal"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| too_large("sale total"))?;

        lines.push(PricedLine {
            position,
            product_id: product.id.clone(),
            quantity: item.quantity,
            unit_price,
            subtotal,
        });
    }

    let priced = PricedCart { lines, total };

    if !allow_negative_stock {
        for (product_id, requested) in priced.quantity_by_product() {
            if let Some(product) = products.get(product_id) {
                if product.stock < requested {
                    return Err(CoreError::InsufficientStock {
                        sku: product.label().to_string(),
                        available: product.stock,
                        requested,
                    });
                }
            }
        }
    }

    Ok(priced)
}

fn too_large(field: &str) -> CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

/// Splits a total into paid and pending.
///
/// ## Rules
/// ```text
/// PAID     → paid = total, pending = 0 (caller amount ignored)
/// CREDIT   → paid = caller amount, pending = total - paid
/// PARTIAL  → same as CREDIT
///
/// caller amount < 0      → rejected
/// caller amount > total  → rejected (would make pending negative)
/// ```
pub fn settle(total: Money, state: PaymentState, amount_paid: Money) -> CoreResult<Settlement> {
    if amount_paid.is_negative() {
        return Err(crate::ValidationError::MustNotBeNegative {
            field: "amount paid".to_string(),
        }
        .into());
    }

    let amount_paid = match state {
        PaymentState::Paid => total,
        PaymentState::Credit | PaymentState::Partial => {
            if amount_paid > total {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("amount paid {} exceeds total {}", amount_paid, total),
                });
            }
            amount_paid
        }
    };

    Ok(Settlement {
        amount_paid,
        pending: total - amount_paid,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            business_id: "biz".to_string(),
            sku: Some(format!("SKU-{}", id)),
            name: format!("Product {}", id),
            cost_cents: price_cents / 2,
            price_cents,
            stock,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(id: &str, quantity: i64) -> CartItem {
        CartItem {
            product_id: id.to_string(),
            quantity,
        }
    }

    fn catalog() -> HashMap<String, Product> {
        [product("A", 1000, 10), product("B", 500, 1)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect()
    }

    #[test]
    fn test_price_cart_reference_scenario() {
        let priced = price_cart(&[item("A", 2), item("B", 1)], &catalog(), true).unwrap();

        assert_eq!(priced.total, Money::from_cents(2500));
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].subtotal, Money::from_cents(2000));
        assert_eq!(priced.lines[1].unit_price, Money::from_cents(500));

        let sum: Money = priced.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(sum, priced.total);
    }

    #[test]
    fn test_price_cart_unknown_product() {
        let err = price_cart(&[item("A", 1), item("Z", 1)], &catalog(), true).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "Z"));
    }

    #[test]
    fn test_price_cart_repeated_product_keeps_lines() {
        let priced = price_cart(&[item("A", 1), item("A", 3)], &catalog(), true).unwrap();
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.quantity_by_product()["A"], 4);
        assert_eq!(priced.total, Money::from_cents(4000));
    }

    #[test]
    fn test_price_cart_oversell_allowed_by_default_policy() {
        assert!(price_cart(&[item("B", 5)], &catalog(), true).is_ok());
    }

    #[test]
    fn test_price_cart_oversell_rejected_when_policy_strict() {
        // Two lines of B sum to 2 while only 1 is in stock
        let err = price_cart(&[item("B", 1), item("B", 1)], &catalog(), false).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                sku,
                available,
                requested,
            } => {
                assert_eq!(sku, "SKU-B");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_price_cart_bulk_quantity() {
        let priced = price_cart(&[item("A", 5000)], &catalog(), true).unwrap();
        assert_eq!(priced.total, Money::from_cents(5_000_000));
    }

    #[test]
    fn test_price_cart_rejects_overflowing_line() {
        let err = price_cart(&[item("A", i64::MAX)], &catalog(), true).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_items() {
        assert!(matches!(validate_items(&[]), Err(CoreError::EmptyCart)));
        assert!(validate_items(&[item("A", 1)]).is_ok());
        assert!(validate_items(&[item("A", 0)]).is_err());
        assert!(validate_items(&[item("A", -2)]).is_err());
        assert!(validate_items(&[item("", 1)]).is_err());

        let too_many: Vec<CartItem> = (0..=MAX_CART_ITEMS).map(|_| item("A", 1)).collect();
        assert!(matches!(
            validate_items(&too_many),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_settle_paid_takes_total() {
        let s = settle(Money::from_cents(2500), PaymentState::Paid, Money::zero()).unwrap();
        assert_eq!(s.amount_paid, Money::from_cents(2500));
        assert_eq!(s.pending, Money::zero());
    }

    #[test]
    fn test_settle_credit_keeps_caller_amount() {
        let s = settle(
            Money::from_cents(2500),
            PaymentState::Credit,
            Money::from_cents(500),
        )
        .unwrap();
        assert_eq!(s.amount_paid, Money::from_cents(500));
        assert_eq!(s.pending, Money::from_cents(2000));
    }

    #[test]
    fn test_settle_rejects_overpayment_and_negative() {
        assert!(matches!(
            settle(
                Money::from_cents(2500),
                PaymentState::Partial,
                Money::from_cents(2600)
            ),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            settle(
                Money::from_cents(2500),
                PaymentState::Credit,
                Money::from_cents(-1)
            ),
            Err(CoreError::Validation(_))
        ));
    }
}
