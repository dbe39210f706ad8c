use chrono::{DateTime, Utc};
use ooloo_shared::types::InventoryStatus;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Pagination;

/// One physical bag. "Rented" is never stored here; occupancy on a given
/// day is derived from reservation date ranges.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub sku: String,
    pub city_id: Uuid,
    pub product_id: Uuid,
    pub status: InventoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ITEM_COLUMNS: &str = "id, sku, city_id, product_id, status, created_at, updated_at";

impl InventoryItem {
    /// Insert one unit with a pre-formatted SKU
    pub async fn insert(
        conn: &mut PgConnection,
        sku: &str,
        city_id: Uuid,
        product_id: Uuid,
    ) -> Result<Self, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "INSERT INTO inventory_items (sku, city_id, product_id)
             VALUES ($1, $2, $3)
             RETURNING {ITEM_COLUMNS}",
        ))
        .bind(sku)
        .bind(city_id)
        .bind(product_id)
        .fetch_one(conn)
        .await?;

        Ok(item)
    }

    /// Highest SKU sequence number already issued for a (city, product)
    /// pool, or zero when the pool is empty. SKUs are fixed-width, so the
    /// lexicographic maximum is also the numeric maximum.
    pub async fn max_sequence(
        conn: &mut PgConnection,
        city_id: Uuid,
        product_id: Uuid,
    ) -> Result<i64, AppError> {
        let last_sku = sqlx::query_scalar::<_, String>(
            "SELECT sku FROM inventory_items
             WHERE city_id = $1 AND product_id = $2
             ORDER BY sku DESC LIMIT 1 FOR UPDATE",
        )
        .bind(city_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(last_sku.as_deref().and_then(sku_sequence).unwrap_or(0))
    }

    /// Toggle a unit's status. Existing reservations are untouched: a
    /// retired unit already reserved for a future date remains honored,
    /// retirement only excludes it from new allocations.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: InventoryStatus,
    ) -> Result<Option<Self>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "UPDATE inventory_items SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}",
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(item)
    }

    /// List units with their city/product slugs, optionally filtered
    pub async fn list(
        pool: &PgPool,
        city_slug: Option<&str>,
        product_slug: Option<&str>,
        status: Option<InventoryStatus>,
        pagination: &Pagination,
    ) -> Result<Vec<InventoryUnitRow>, AppError> {
        let rows = sqlx::query_as::<_, InventoryUnitRow>(
            "SELECT i.id, i.sku, c.slug AS city_slug, p.slug AS product_slug,
                    i.status, i.created_at
             FROM inventory_items i
             JOIN cities c ON c.id = i.city_id
             JOIN products p ON p.id = i.product_id
             WHERE ($1::varchar IS NULL OR c.slug = $1)
               AND ($2::varchar IS NULL OR p.slug = $2)
               AND ($3::inventory_status IS NULL OR i.status = $3)
             ORDER BY i.sku
             LIMIT $4 OFFSET $5",
        )
        .bind(city_slug)
        .bind(product_slug)
        .bind(status)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// One unit with its slugs resolved
    pub async fn find_row(pool: &PgPool, id: Uuid) -> Result<Option<InventoryUnitRow>, AppError> {
        let row = sqlx::query_as::<_, InventoryUnitRow>(
            "SELECT i.id, i.sku, c.slug AS city_slug, p.slug AS product_slug,
                    i.status, i.created_at
             FROM inventory_items i
             JOIN cities c ON c.id = i.city_id
             JOIN products p ON p.id = i.product_id
             WHERE i.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}

/// A unit joined with its city and product slugs, for admin listings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InventoryUnitRow {
    pub id: Uuid,
    pub sku: String,
    pub city_slug: String,
    pub product_slug: String,
    pub status: InventoryStatus,
    pub created_at: DateTime<Utc>,
}

/// SKU format: `CITY-PRODUCT-0042`, sequence numbered per (city, product).
pub fn format_sku(city_slug: &str, product_slug: &str, sequence: i64) -> String {
    format!(
        "{}-{}-{:04}",
        city_slug.to_uppercase(),
        product_slug.to_uppercase(),
        sequence
    )
}

fn sku_sequence(sku: &str) -> Option<i64> {
    sku.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_round_trips_through_sequence_parse() {
        let sku = format_sku("austin", "carryon", 7);
        assert_eq!(sku, "AUSTIN-CARRYON-0007");
        assert_eq!(sku_sequence(&sku), Some(7));
        assert_eq!(sku_sequence("DALLAS-LARGE-0123"), Some(123));
        assert_eq!(sku_sequence("garbage"), None);
    }
}
