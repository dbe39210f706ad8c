use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::{City, Product, Reservation};
use ooloo_shared::constants::{CARRYON_SLUG, LARGE_SLUG};
use ooloo_shared::dto::{AvailabilityRequest, AvailabilityResponse};

/// Answers "how many units of product P in city C are free for [start, end]"
/// against live reservation data. Purely a query layer; allocation happens
/// in the booking service at commit time.
#[derive(Clone)]
pub struct AvailabilityService {
    pool: PgPool,
}

impl AvailabilityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn check(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResponse, AppError> {
        if request.start_date > request.end_date {
            return Err(AppError::Validation(
                "start_date must be on or before end_date".to_string(),
            ));
        }

        let city = City::find_by_slug(&self.pool, &request.city_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown city: {}", request.city_slug)))?;
        let product = Product::find_by_slug(&self.pool, &request.product_slug)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Unknown product: {}", request.product_slug))
            })?;

        let available = self
            .product_availability(&city, &product, request.start_date, request.end_date)
            .await?;
        debug!(
            city = %city.slug,
            product = %product.slug,
            available,
            "Availability computed"
        );

        Ok(AvailabilityResponse {
            product_slug: product.slug,
            start_date: request.start_date,
            end_date: request.end_date,
            available,
        })
    }

    /// Free-unit count for one product. The composite set has no pool of
    /// its own: its availability is the minimum of the carry-on and large
    /// pools, since each set consumes one of each.
    pub async fn product_availability(
        &self,
        city: &City,
        product: &Product,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, AppError> {
        if !product.is_set() {
            return Reservation::available_count(&self.pool, city.id, product.id, start, end).await;
        }

        let carryon = self.component(CARRYON_SLUG).await?;
        let large = self.component(LARGE_SLUG).await?;
        let carryon_free =
            Reservation::available_count(&self.pool, city.id, carryon.id, start, end).await?;
        let large_free =
            Reservation::available_count(&self.pool, city.id, large.id, start, end).await?;

        Ok(carryon_free.min(large_free))
    }

    async fn component(&self, slug: &str) -> Result<Product, AppError> {
        Product::find_by_slug(&self.pool, slug)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Catalog is missing the {slug} set component"))
            })
    }
}
