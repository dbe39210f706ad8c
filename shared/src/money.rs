//! Integer-cents arithmetic. Amounts never pass through floating point;
//! rates multiply through `Decimal` and round half-up back to cents at each
//! step, matching how historical orders were priced.

use crate::types::Cents;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Whole-number percentage of an amount, rounded half-up.
pub fn percent_of(amount: Cents, percent: i64) -> Cents {
    debug_assert!(amount >= 0 && percent >= 0);
    (amount * percent + 50) / 100
}

/// `amount × rate`, rounded half-up to whole cents. Used for tax, where the
/// rate is a per-city decimal (e.g. 0.095).
pub fn rate_of(amount: Cents, rate: Decimal) -> Cents {
    let product = Decimal::from(amount) * rate;
    product
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Clamp a discount so it never exceeds what is left to discount.
pub fn clamp_discount(discount: Cents, remaining: Cents) -> Cents {
    discount.min(remaining).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(10000, 10), 1000);
        // 10% of 1005 = 100.5, half rounds up
        assert_eq!(percent_of(1005, 10), 101);
        // 10% of 1004 = 100.4
        assert_eq!(percent_of(1004, 10), 100);
        assert_eq!(percent_of(0, 10), 0);
        assert_eq!(percent_of(12345, 0), 0);
    }

    #[test]
    fn rate_rounds_half_up() {
        let rate = Decimal::new(95, 3); // 0.095
        assert_eq!(rate_of(10000, rate), 950);
        // 10530 × 0.095 = 1000.35
        assert_eq!(rate_of(10530, rate), 1000);
        // 1000 × 0.0825 = 82.5, half rounds up
        assert_eq!(rate_of(1000, Decimal::new(825, 4)), 83);
        assert_eq!(rate_of(0, rate), 0);
    }

    #[test]
    fn discounts_clamp_to_remainder() {
        assert_eq!(clamp_discount(500, 1000), 500);
        assert_eq!(clamp_discount(1500, 1000), 1000);
        assert_eq!(clamp_discount(-5, 1000), 0);
        assert_eq!(clamp_discount(500, 0), 0);
    }
}
