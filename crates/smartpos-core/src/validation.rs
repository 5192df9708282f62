//! # Validation Module
//!
//! Input validation for sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (serde)                                                 │
//! │  └── Type validation (deserialization, wire enum names)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation, before the transaction opens            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (national id, email per business; one debt per sale)       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{NewCustomer, PaymentMethod};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates that an identifier is present.
///
/// Format is not checked: an id that does not resolve within the business
/// is a not-found, not a validation failure.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// Only the sign is checked. Bulk and weighed goods sell in large
/// quantities; overflow is caught when the line is priced.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount in cents that may be zero.
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a credit term in days. Zero means "use the default".
pub fn validate_credit_days(days: i64) -> ValidationResult<()> {
    if !(0..=365).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "credit days".to_string(),
            min: 0,
            max: 365,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a payment method label.
pub fn validate_payment_method(method: &PaymentMethod) -> ValidationResult<()> {
    let method = method.as_str();

    if method.is_empty() {
        return Err(ValidationError::Required {
            field: "payment method".to_string(),
        });
    }

    if method.len() > 30 {
        return Err(ValidationError::TooLong {
            field: "payment method".to_string(),
            max: 30,
        });
    }

    Ok(())
}

/// Validates an email address (shape only).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates an inline customer registration.
///
/// Expects [`NewCustomer::normalized`] to have run first.
///
/// ## Example
/// ```rust
/// use smartpos_core::NewCustomer;
/// use smartpos_core::validation::validate_new_customer;
///
/// let ok = NewCustomer { name: "Ana".into(), ..Default::default() };
/// assert!(validate_new_customer(&ok).is_ok());
///
/// let nameless = NewCustomer::default();
/// assert!(validate_new_customer(&nameless).is_err());
/// ```
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    if customer.name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        });
    }

    if customer.name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 200,
        });
    }

    if let Some(email) = &customer.email {
        validate_email(email)?;
    }

    if let Some(limit) = customer.credit_limit_cents {
        validate_non_negative_cents("credit limit", limit)?;
    }

    if let Some(days) = customer.credit_days {
        validate_credit_days(days)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("product_id", "").is_err());
        assert!(validate_id("product_id", "   ").is_err());
        assert!(validate_id("product_id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(250_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_credit_days() {
        assert!(validate_credit_days(0).is_ok());
        assert!(validate_credit_days(30).is_ok());
        assert!(validate_credit_days(-1).is_err());
        assert!(validate_credit_days(400).is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert!(validate_payment_method(&PaymentMethod::default()).is_ok());
        assert!(validate_payment_method(&PaymentMethod::new("  ")).is_err());
        assert!(validate_payment_method(&PaymentMethod::new("X".repeat(31))).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@tienda.ec").is_ok());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@tienda.ec").is_err());
        assert!(validate_email("ana@tienda").is_err());
    }

    #[test]
    fn test_validate_new_customer() {
        let mut customer = NewCustomer {
            name: "Ana".into(),
            credit_limit_cents: Some(10_000),
            credit_days: Some(15),
            ..Default::default()
        };
        assert!(validate_new_customer(&customer).is_ok());

        customer.credit_limit_cents = Some(-1);
        assert!(validate_new_customer(&customer).is_err());

        customer.credit_limit_cents = None;
        customer.email = Some("not-an-email".into());
        assert!(validate_new_customer(&customer).is_err());
    }
}
