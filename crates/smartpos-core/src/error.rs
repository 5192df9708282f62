//! # Error Types
//!
//! Domain-specific error types for smartpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  smartpos-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations, missing entities     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  smartpos-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── SaleError        - CoreError | DbError | CreatedButUnreadable     │
//! │                                                                         │
//! │  HTTP errors (apps/server)                                             │
//! │  └── ApiError         - What the client sees (status + code + message) │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SaleError → ApiError → Client     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant aborts a sale before commit. The HTTP layer maps
/// not-found variants to 404 and everything else to 400.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found for the business.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product belongs to another business
    /// - Product was deactivated
    #[error("Product {0} does not exist or does not belong to this business")]
    ProductNotFound(String),

    /// Customer cannot be found for the business.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Insufficient stock to complete sale.
    ///
    /// ## When This Occurs
    /// Only when the negative-stock policy is switched off. By default a
    /// sale is never rejected for stock.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Customer does not have enough credit headroom.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale on credit (total $25.00)
    ///      │
    ///      ▼
    /// limit $100.00 - outstanding $80.00 = $20.00 available
    ///      │
    ///      ▼
    /// InsufficientCredit { available: $20.00, requested: $25.00 }
    ///      │
    ///      ▼
    /// Nothing written, cashier asks for another payment method
    /// ```
    #[error("Insufficient credit: available {available}, requested {requested}")]
    InsufficientCredit { available: Money, requested: Money },

    /// Cart has no lines.
    #[error("Sale must contain at least one item")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "unknown entity for this business" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_) | CoreError::CustomerNotFound(_) | CoreError::SaleNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any row is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value does not fit in the integer range used for money.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "COKE-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COKE-330: available 3, requested 5"
        );
    }

    #[test]
    fn test_insufficient_credit_mentions_both_amounts() {
        let err = CoreError::InsufficientCredit {
            available: Money::from_cents(2000),
            requested: Money::from_cents(2500),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient credit: available $20.00, requested $25.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::MustNotBeNegative {
            field: "amount paid".to_string(),
        };
        assert_eq!(err.to_string(), "amount paid must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_not_found_family() {
        assert!(CoreError::ProductNotFound("p".into()).is_not_found());
        assert!(CoreError::CustomerNotFound("c".into()).is_not_found());
        assert!(!CoreError::EmptyCart.is_not_found());
    }
}
