//! Database models for the luggage rental platform.
//!
//! Each model corresponds to a database table and provides type-safe
//! operations using sqlx. Read paths take a `&PgPool`; anything that has to
//! participate in the checkout or cancellation transaction takes a
//! `&mut PgConnection` so the caller controls the transaction boundary.

pub mod addon;
pub mod city;
pub mod customer;
pub mod inventory;
pub mod order;
pub mod product;
pub mod promo_code;
pub mod reservation;

pub use addon::Addon;
pub use city::City;
pub use customer::Customer;
pub use inventory::{InventoryItem, InventoryUnitRow};
pub use order::{NewOrder, Order, OrderAddon, OrderItem, OrderSummaryRow};
pub use product::Product;
pub use promo_code::PromoCode;
pub use reservation::Reservation;

use ooloo_shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Pagination helper
#[derive(Debug, Clone)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn page(page: Option<i64>, per_page: Option<i64>) -> Self {
        let per_page = per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = page.unwrap_or(1).max(1);
        Self {
            limit: per_page,
            offset: (page - 1) * per_page,
        }
    }
}
