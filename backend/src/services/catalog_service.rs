use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::{Addon, City, Product};
use ooloo_shared::dto::{
    AddonResponse, CatalogResponse, CityResponse, ProductResponse,
};

/// Read-only catalog for the booking UI: the city's tax context plus the
/// active products and addons it can rent.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn catalog(&self, city_slug: &str) -> Result<CatalogResponse, AppError> {
        let city = City::find_by_slug(&self.pool, city_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown city: {}", city_slug)))?;
        let products = Product::find_active(&self.pool).await?;
        let addons = Addon::find_active(&self.pool).await?;

        debug!(city = %city.slug, products = products.len(), addons = addons.len(), "Catalog served");

        Ok(CatalogResponse {
            city: CityResponse {
                id: city.id,
                slug: city.slug.clone(),
                name: city.name.clone(),
                tax_rate: city.effective_tax_rate(),
            },
            products: products
                .into_iter()
                .map(|product| ProductResponse {
                    id: product.id,
                    slug: product.slug,
                    name: product.name,
                    daily_rate_cents: product.daily_rate_cents,
                    sort_order: product.sort_order,
                })
                .collect(),
            addons: addons
                .into_iter()
                .map(|addon| AddonResponse {
                    id: addon.id,
                    slug: addon.slug,
                    name: addon.name,
                    price_cents: addon.price_cents,
                })
                .collect(),
        })
    }

    /// Active cities for the city picker.
    pub async fn cities(&self) -> Result<Vec<CityResponse>, AppError> {
        let cities = City::find_active(&self.pool).await?;
        Ok(cities
            .into_iter()
            .map(|city| {
                let tax_rate = city.effective_tax_rate();
                CityResponse {
                    id: city.id,
                    slug: city.slug,
                    name: city.name,
                    tax_rate,
                }
            })
            .collect())
    }
}
