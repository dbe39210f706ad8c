use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;

/// A date-ranged claim on one inventory unit. Ranges are inclusive on both
/// ends; a unit returned on a given day cannot go out again that same day.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub order_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// How many units of (city, product) are free for the inclusive range
    /// [start, end]: non-retired units with no overlapping reservation.
    /// The overlap test is `existing.start <= end AND existing.end >= start`
    /// so touching endpoints conflict.
    pub async fn available_count<'e, E>(
        executor: E,
        city_id: Uuid,
        product_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_items i
             WHERE i.city_id = $1
               AND i.product_id = $2
               AND i.status = 'available'
               AND NOT EXISTS (
                   SELECT 1 FROM reservations r
                   WHERE r.inventory_item_id = i.id
                     AND r.start_date <= $4
                     AND r.end_date >= $3
               )",
        )
        .bind(city_id)
        .bind(product_id)
        .bind(start)
        .bind(end)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Claim up to `quantity` free units for an order in one statement:
    /// the CTE picks and locks free units, the insert reserves them. Units
    /// are taken lowest SKU first so assignment is predictable for ops.
    /// Returns the reservations actually created; fewer than `quantity`
    /// means the pool ran short and the caller must roll back.
    pub async fn allocate(
        conn: &mut PgConnection,
        order_id: Uuid,
        city_id: Uuid,
        product_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        quantity: i64,
    ) -> Result<Vec<Self>, AppError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "WITH picked AS (
                 SELECT i.id FROM inventory_items i
                 WHERE i.city_id = $2
                   AND i.product_id = $3
                   AND i.status = 'available'
                   AND NOT EXISTS (
                       SELECT 1 FROM reservations r
                       WHERE r.inventory_item_id = i.id
                         AND r.start_date <= $5
                         AND r.end_date >= $4
                   )
                 ORDER BY i.sku
                 LIMIT $6
                 FOR UPDATE OF i
             )
             INSERT INTO reservations (inventory_item_id, order_id, start_date, end_date)
             SELECT picked.id, $1, $4, $5 FROM picked
             RETURNING id, inventory_item_id, order_id, start_date, end_date, created_at",
        )
        .bind(order_id)
        .bind(city_id)
        .bind(product_id)
        .bind(start)
        .bind(end)
        .bind(quantity)
        .fetch_all(conn)
        .await?;

        Ok(reservations)
    }

    /// Release every reservation held by an order. Deleting zero rows is
    /// fine; cancellation is idempotent at this step.
    pub async fn delete_for_order(conn: &mut PgConnection, order_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM reservations WHERE order_id = $1")
            .bind(order_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Current and future reservations across a batch of units, for the
    /// admin inventory listing
    pub async fn find_upcoming_for_items(
        pool: &PgPool,
        item_ids: &[Uuid],
    ) -> Result<Vec<Self>, AppError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT id, inventory_item_id, order_id, start_date, end_date, created_at
             FROM reservations
             WHERE inventory_item_id = ANY($1) AND end_date >= CURRENT_DATE
             ORDER BY inventory_item_id, start_date",
        )
        .bind(item_ids)
        .fetch_all(pool)
        .await?;

        Ok(reservations)
    }
}
