//! Pure pricing engine. Turns a cart, its dates, and any applied codes into
//! a fully itemized breakdown. No I/O and no hidden state: given the same
//! input it always produces the same output, and a stored breakdown can be
//! re-derived later for display.
//!
//! Discounts stack in a fixed order because each later discount is computed
//! on the rental amount left by the previous one:
//!   early-bird -> promo or referral -> credit
//! Discounts only ever reduce the rental portion. Addons, delivery fees and
//! tax are never discounted.

use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

use crate::constants::{
    EARLY_BIRD_MIN_DAYS, EARLY_BIRD_PERCENT, ONE_WAY_DELIVERY_FEE_CENTS,
    REFERRAL_DISCOUNT_CENTS, ROUND_TRIP_DELIVERY_FEE_CENTS, RUSH_CUTOFF_DAYS, RUSH_FEE_CENTS,
    SHIP_BACK_FEE_CENTS,
};
use crate::money::{clamp_discount, percent_of, rate_of};
use crate::types::{Cents, DiscountType, ReturnMethod};

/// One rental line: a product at its snapshotted daily rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalLine {
    pub quantity: i64,
    pub daily_rate_cents: Cents,
}

/// One addon line. Addons are flat-priced per rental, not per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonLine {
    pub quantity: i64,
    pub price_cents: Cents,
}

/// A code applied at checkout. Promo codes and referral codes are mutually
/// exclusive, which this type makes unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CodeDiscount {
    Promo {
        discount_type: DiscountType,
        value: i64,
    },
    Referral,
}

/// Everything the engine needs to price a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteInput {
    pub rental_lines: Vec<RentalLine>,
    pub addon_lines: Vec<AddonLine>,
    /// Billable days, already floored at 1.
    pub days: i64,
    /// Whole days from "now" until midnight of the delivery date.
    pub days_until_delivery: i64,
    pub return_method: ReturnMethod,
    pub code_discount: Option<CodeDiscount>,
    /// The customer's accumulated referral credit, if any.
    pub credit_balance_cents: Cents,
    /// Per-city tax rate, e.g. 0.095.
    pub tax_rate: Decimal,
}

/// Itemized result. Every component is persisted on the order so the total
/// can be reproduced from stored fields alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub rental_subtotal_cents: Cents,
    pub addons_subtotal_cents: Cents,
    pub subtotal_cents: Cents,
    pub early_bird_discount_cents: Cents,
    pub promo_discount_cents: Cents,
    pub referral_discount_cents: Cents,
    pub credit_applied_cents: Cents,
    pub discount_total_cents: Cents,
    pub delivery_fee_cents: Cents,
    pub ship_back_fee_cents: Cents,
    pub rush_fee_cents: Cents,
    pub tax_cents: Cents,
    pub total_cents: Cents,
}

impl PriceBreakdown {
    /// Re-derives the total from the stored components. Must always equal
    /// `total_cents`; used to verify persisted orders.
    pub fn recomputed_total(&self) -> Cents {
        self.subtotal_cents - self.discount_total_cents
            + self.delivery_fee_cents
            + self.ship_back_fee_cents
            + self.rush_fee_cents
            + self.tax_cents
    }
}

/// Price a booking. Quantities and days are assumed validated upstream
/// (non-negative quantities, days >= 1).
pub fn quote(input: &QuoteInput) -> PriceBreakdown {
    let rental_subtotal: Cents = input
        .rental_lines
        .iter()
        .map(|line| line.quantity * line.daily_rate_cents * input.days)
        .sum();
    let addons_subtotal: Cents = input
        .addon_lines
        .iter()
        .map(|line| line.quantity * line.price_cents)
        .sum();
    let subtotal = rental_subtotal + addons_subtotal;

    // 1. Early-bird, on the rental subtotal only.
    let early_bird = if input.days_until_delivery >= EARLY_BIRD_MIN_DAYS {
        percent_of(rental_subtotal, EARLY_BIRD_PERCENT)
    } else {
        0
    };
    let mut rental_remaining = rental_subtotal - early_bird;

    // 2. Promo or referral, on what early-bird left. Fixed promos clamp to
    //    the remaining rental so the rental portion can never go negative.
    let (promo_discount, referral_discount) = match &input.code_discount {
        Some(CodeDiscount::Promo {
            discount_type,
            value,
        }) => {
            let discount = match discount_type {
                DiscountType::Percent => percent_of(rental_remaining, *value),
                DiscountType::Fixed => clamp_discount(*value, rental_remaining),
            };
            (discount, 0)
        }
        Some(CodeDiscount::Referral) => {
            (0, clamp_discount(REFERRAL_DISCOUNT_CENTS, rental_remaining))
        }
        None => (0, 0),
    };
    rental_remaining -= promo_discount + referral_discount;

    // 3. Credit, capped at the remaining rental. Never offsets addons,
    //    fees, or tax.
    let credit_applied = clamp_discount(input.credit_balance_cents, rental_remaining);

    let discount_total = early_bird + promo_discount + referral_discount + credit_applied;

    let rush_fee = if input.days_until_delivery <= RUSH_CUTOFF_DAYS {
        RUSH_FEE_CENTS
    } else {
        0
    };
    let (delivery_fee, ship_back_fee) = match input.return_method {
        ReturnMethod::Pickup => (ROUND_TRIP_DELIVERY_FEE_CENTS, 0),
        ReturnMethod::Ship => (ONE_WAY_DELIVERY_FEE_CENTS, SHIP_BACK_FEE_CENTS),
    };

    let taxable = subtotal - discount_total + delivery_fee + ship_back_fee + rush_fee;
    let tax = rate_of(taxable, input.tax_rate);

    PriceBreakdown {
        rental_subtotal_cents: rental_subtotal,
        addons_subtotal_cents: addons_subtotal,
        subtotal_cents: subtotal,
        early_bird_discount_cents: early_bird,
        promo_discount_cents: promo_discount,
        referral_discount_cents: referral_discount,
        credit_applied_cents: credit_applied,
        discount_total_cents: discount_total,
        delivery_fee_cents: delivery_fee,
        ship_back_fee_cents: ship_back_fee,
        rush_fee_cents: rush_fee,
        tax_cents: tax,
        total_cents: taxable + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_TAX_RATE;

    fn base_input() -> QuoteInput {
        QuoteInput {
            rental_lines: vec![RentalLine {
                quantity: 1,
                daily_rate_cents: 2000,
            }],
            addon_lines: vec![],
            days: 5,
            days_until_delivery: 10,
            return_method: ReturnMethod::Pickup,
            code_discount: None,
            credit_balance_cents: 0,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    #[test]
    fn plain_pickup_booking() {
        let breakdown = quote(&base_input());
        assert_eq!(breakdown.rental_subtotal_cents, 10000);
        assert_eq!(breakdown.subtotal_cents, 10000);
        assert_eq!(breakdown.discount_total_cents, 0);
        assert_eq!(breakdown.delivery_fee_cents, 1999);
        assert_eq!(breakdown.ship_back_fee_cents, 0);
        assert_eq!(breakdown.rush_fee_cents, 0);
        // (10000 + 1999) * 0.095 = 1139.905 -> 1140
        assert_eq!(breakdown.tax_cents, 1140);
        assert_eq!(breakdown.total_cents, 13139);
        assert_eq!(breakdown.recomputed_total(), breakdown.total_cents);
    }

    #[test]
    fn addons_are_flat_and_never_discounted() {
        let mut input = base_input();
        input.addon_lines = vec![AddonLine {
            quantity: 2,
            price_cents: 500,
        }];
        input.days_until_delivery = 90;
        let breakdown = quote(&input);
        assert_eq!(breakdown.addons_subtotal_cents, 1000);
        // early-bird applies to the 10000 rental only, not the addons
        assert_eq!(breakdown.early_bird_discount_cents, 1000);
        assert_eq!(breakdown.subtotal_cents, 11000);
    }

    #[test]
    fn early_bird_boundary() {
        let mut input = base_input();
        input.days_until_delivery = 59;
        assert_eq!(quote(&input).early_bird_discount_cents, 0);
        input.days_until_delivery = 60;
        assert_eq!(quote(&input).early_bird_discount_cents, 1000);
    }

    #[test]
    fn rush_fee_boundary() {
        let mut input = base_input();
        input.days_until_delivery = 2;
        assert_eq!(quote(&input).rush_fee_cents, 0);
        input.days_until_delivery = 1;
        assert_eq!(quote(&input).rush_fee_cents, 999);
        input.days_until_delivery = 0;
        assert_eq!(quote(&input).rush_fee_cents, 999);
    }

    #[test]
    fn early_bird_then_percent_promo() {
        // rental 10000, 65 days out, 10%-off promo:
        // early-bird 1000, promo base 9000, promo 900, rental after 8100
        let mut input = base_input();
        input.days_until_delivery = 65;
        input.code_discount = Some(CodeDiscount::Promo {
            discount_type: DiscountType::Percent,
            value: 10,
        });
        let breakdown = quote(&input);
        assert_eq!(breakdown.early_bird_discount_cents, 1000);
        assert_eq!(breakdown.promo_discount_cents, 900);
        assert_eq!(
            breakdown.rental_subtotal_cents - breakdown.discount_total_cents,
            8100
        );
    }

    #[test]
    fn fixed_promo_clamps_to_remaining_rental() {
        let mut input = base_input();
        input.rental_lines = vec![RentalLine {
            quantity: 1,
            daily_rate_cents: 500,
        }];
        input.days = 2; // rental 1000
        input.code_discount = Some(CodeDiscount::Promo {
            discount_type: DiscountType::Fixed,
            value: 5000,
        });
        let breakdown = quote(&input);
        assert_eq!(breakdown.promo_discount_cents, 1000);
        assert_eq!(
            breakdown.rental_subtotal_cents - breakdown.discount_total_cents,
            0
        );
        assert!(breakdown.total_cents >= 0);
    }

    #[test]
    fn referral_discount_is_flat() {
        let mut input = base_input();
        input.code_discount = Some(CodeDiscount::Referral);
        let breakdown = quote(&input);
        assert_eq!(breakdown.referral_discount_cents, 1000);
        assert_eq!(breakdown.promo_discount_cents, 0);
    }

    #[test]
    fn credit_caps_at_remaining_rental() {
        let mut input = base_input();
        input.days_until_delivery = 70;
        input.credit_balance_cents = 50000;
        input.addon_lines = vec![AddonLine {
            quantity: 1,
            price_cents: 700,
        }];
        let breakdown = quote(&input);
        // rental 10000 - 1000 early-bird = 9000 available for credit
        assert_eq!(breakdown.credit_applied_cents, 9000);
        // addons and fees survive untouched
        assert_eq!(
            breakdown.subtotal_cents - breakdown.discount_total_cents,
            700
        );
        assert_eq!(breakdown.delivery_fee_cents, 1999);
    }

    #[test]
    fn partial_credit_is_taken_in_full() {
        let mut input = base_input();
        input.credit_balance_cents = 1500;
        let breakdown = quote(&input);
        assert_eq!(breakdown.credit_applied_cents, 1500);
    }

    #[test]
    fn ship_back_fee_schedule() {
        let mut input = base_input();
        input.return_method = ReturnMethod::Ship;
        let breakdown = quote(&input);
        assert_eq!(breakdown.delivery_fee_cents, 999);
        assert_eq!(breakdown.ship_back_fee_cents, 2999);
    }

    #[test]
    fn tax_applies_after_discounts_and_fees() {
        let mut input = base_input();
        input.days_until_delivery = 60;
        input.return_method = ReturnMethod::Ship;
        let breakdown = quote(&input);
        let taxable = 10000 - 1000 + 999 + 2999;
        assert_eq!(
            breakdown.tax_cents,
            crate::money::rate_of(taxable, DEFAULT_TAX_RATE)
        );
        assert_eq!(breakdown.total_cents, taxable + breakdown.tax_cents);
    }

    #[test]
    fn quote_is_deterministic() {
        let mut input = base_input();
        input.days_until_delivery = 65;
        input.code_discount = Some(CodeDiscount::Promo {
            discount_type: DiscountType::Percent,
            value: 15,
        });
        input.credit_balance_cents = 300;
        let first = quote(&input);
        let second = quote(&input);
        assert_eq!(first, second);
        assert_eq!(first.recomputed_total(), first.total_cents);
    }

    #[test]
    fn empty_cart_still_carries_fees() {
        let mut input = base_input();
        input.rental_lines.clear();
        let breakdown = quote(&input);
        assert_eq!(breakdown.rental_subtotal_cents, 0);
        assert_eq!(breakdown.delivery_fee_cents, 1999);
        assert_eq!(breakdown.total_cents, 1999 + breakdown.tax_cents);
    }
}
