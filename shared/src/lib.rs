pub mod constants;
pub mod dates;
pub mod dto;
pub mod money;
pub mod pricing;
pub mod types;

pub use pricing::{quote, AddonLine, CodeDiscount, PriceBreakdown, QuoteInput, RentalLine};
pub use types::Cents;
