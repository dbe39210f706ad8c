use crate::types::Cents;
use rust_decimal::Decimal;

// Discount schedule
pub const EARLY_BIRD_MIN_DAYS: i64 = 60;
pub const EARLY_BIRD_PERCENT: i64 = 10;
pub const REFERRAL_DISCOUNT_CENTS: Cents = 1000;
/// Credit granted to the referrer once a referred order is confirmed.
pub const REFERRAL_REWARD_CENTS: Cents = 1000;

// Fee schedule
pub const RUSH_CUTOFF_DAYS: i64 = 1;
pub const RUSH_FEE_CENTS: Cents = 999;
/// Round-trip delivery + pickup fee.
pub const ROUND_TRIP_DELIVERY_FEE_CENTS: Cents = 1999;
/// One-way delivery fee for ship-back orders (no pickup leg).
pub const ONE_WAY_DELIVERY_FEE_CENTS: Cents = 999;
/// Prepaid return label cost for ship-back orders.
pub const SHIP_BACK_FEE_CENTS: Cents = 2999;

// Tax
/// Applied when a city record carries no tax rate of its own (9.5%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(95, 0, 0, false, 3);

// Customer-facing cutoffs
pub const CANCELLATION_CUTOFF_HOURS: i64 = 48;
pub const ADDRESS_CHANGE_CUTOFF_HOURS: i64 = 24;

// Product catalog slugs with composition semantics
pub const CARRYON_SLUG: &str = "carryon";
pub const LARGE_SLUG: &str = "large";
/// Virtual bundle: one carry-on + one large per set, no pool of its own.
pub const SET_SLUG: &str = "set";

// Pagination defaults
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// Abandonment sweep
/// Pending orders older than this are auto-cancelled by the sweep task.
pub const ABANDONED_PENDING_MAX_HOURS: i64 = 24;
