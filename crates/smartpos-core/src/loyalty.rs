//! # Loyalty Accrual
//!
//! One point per whole unit spent on a fully paid sale. Credit and
//! partial sales earn nothing.

use crate::money::Money;
use crate::types::PaymentState;

/// Spend that earns one point: 1000 currency units.
pub const DEFAULT_POINTS_UNIT: Money = Money::from_major(1000);

/// Points earned for a sale total, `floor(total / unit)`.
pub fn points_for(total: Money, unit: Money) -> i64 {
    total.whole_units_of(unit)
}

/// Points a sale earns given its settlement state and customer.
///
/// ## Rules
/// ```text
/// no customer        → 0
/// state != PAID      → 0
/// otherwise          → floor(total / unit)
/// ```
pub fn accrual(state: PaymentState, has_customer: bool, total: Money, unit: Money) -> i64 {
    if !has_customer || state != PaymentState::Paid {
        return 0;
    }
    points_for(total, unit)
}
