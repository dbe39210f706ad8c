use chrono::{DateTime, Utc};
use ooloo_shared::types::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Addon {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub price_cents: Cents,
    pub active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Addon {
    /// Find an active addon by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, AppError> {
        let addon = sqlx::query_as::<_, Addon>(
            "SELECT id, slug, name, price_cents, active, sort_order, created_at
             FROM addons WHERE slug = $1 AND active = TRUE",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(addon)
    }

    /// List all active addons in display order
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let addons = sqlx::query_as::<_, Addon>(
            "SELECT id, slug, name, price_cents, active, sort_order, created_at
             FROM addons WHERE active = TRUE ORDER BY sort_order, slug",
        )
        .fetch_all(pool)
        .await?;

        Ok(addons)
    }
}
