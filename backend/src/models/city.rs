use chrono::{DateTime, Utc};
use ooloo_shared::constants::DEFAULT_TAX_RATE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct City {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub tax_rate: Option<Decimal>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl City {
    /// Find a city by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let city = sqlx::query_as::<_, City>(
            "SELECT id, slug, name, tax_rate, active, created_at
             FROM cities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(city)
    }

    /// Find an active city by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, AppError> {
        let city = sqlx::query_as::<_, City>(
            "SELECT id, slug, name, tax_rate, active, created_at
             FROM cities WHERE slug = $1 AND active = TRUE",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(city)
    }

    /// List all active cities
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT id, slug, name, tax_rate, active, created_at
             FROM cities WHERE active = TRUE ORDER BY slug",
        )
        .fetch_all(pool)
        .await?;

        Ok(cities)
    }

    /// The tax rate to charge, falling back to the platform default when the
    /// city record has none.
    pub fn effective_tax_rate(&self) -> Decimal {
        self.tax_rate.unwrap_or(DEFAULT_TAX_RATE)
    }
}
