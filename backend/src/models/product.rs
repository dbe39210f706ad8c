use chrono::{DateTime, Utc};
use ooloo_shared::constants::SET_SLUG;
use ooloo_shared::types::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub daily_rate_cents: Cents,
    pub active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Find an active product by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, slug, name, daily_rate_cents, active, sort_order, created_at
             FROM products WHERE slug = $1 AND active = TRUE",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// List all active products in display order
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, slug, name, daily_rate_cents, active, sort_order, created_at
             FROM products WHERE active = TRUE ORDER BY sort_order, slug",
        )
        .fetch_all(pool)
        .await?;

        Ok(products)
    }

    /// The composite set has no inventory pool of its own; it consumes one
    /// carry-on and one large unit per set.
    pub fn is_set(&self) -> bool {
        self.slug == SET_SLUG
    }
}
