use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::inventory::format_sku;
use crate::models::{City, InventoryItem, InventoryUnitRow, Pagination, Product, Reservation};
use ooloo_shared::dto::{
    CreateUnitsRequest, CreateUnitsResponse, InventoryItemResponse, InventoryQuery,
    ReservationRangeResponse,
};
use ooloo_shared::types::InventoryStatus;

/// Admin-side inventory ledger operations: minting units in bulk and
/// toggling their lifecycle status.
#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
}

impl InventoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mint `quantity` new units, continuing the SKU sequence from the
    /// highest already issued for that (city, product) pool. All inserts
    /// share one transaction so a failure mints nothing.
    pub async fn create_units(
        &self,
        request: &CreateUnitsRequest,
    ) -> Result<CreateUnitsResponse, AppError> {
        let city = City::find_by_slug(&self.pool, &request.city_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown city: {}", request.city_slug)))?;
        let product = Product::find_by_slug(&self.pool, &request.product_slug)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Unknown product: {}", request.product_slug))
            })?;
        if product.is_set() {
            return Err(AppError::Validation(
                "The set is a virtual product; stock carry-on and large units instead".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let start = InventoryItem::max_sequence(&mut tx, city.id, product.id).await? + 1;
        let mut skus = Vec::with_capacity(request.quantity as usize);
        for offset in 0..i64::from(request.quantity) {
            let sku = format_sku(&city.slug, &product.slug, start + offset);
            InventoryItem::insert(&mut tx, &sku, city.id, product.id).await?;
            skus.push(sku);
        }
        tx.commit().await?;

        info!(
            city = %city.slug,
            product = %product.slug,
            created = request.quantity,
            "Inventory units created"
        );
        Ok(CreateUnitsResponse {
            created: request.quantity,
            skus,
        })
    }

    /// Exclude a unit from new allocations. Reservations it already holds
    /// remain honored.
    pub async fn retire(&self, id: Uuid) -> Result<InventoryItemResponse, AppError> {
        self.set_status(id, InventoryStatus::Retired).await
    }

    /// Return a retired unit to the allocatable pool.
    pub async fn reactivate(&self, id: Uuid) -> Result<InventoryItemResponse, AppError> {
        self.set_status(id, InventoryStatus::Available).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: InventoryStatus,
    ) -> Result<InventoryItemResponse, AppError> {
        let item = InventoryItem::set_status(&self.pool, id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown inventory unit: {}", id)))?;
        info!(sku = %item.sku, status = ?status, "Inventory unit status changed");

        let row = InventoryItem::find_row(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown inventory unit: {}", id)))?;
        let mut ranges = self.upcoming_ranges(&[row.id]).await?;
        let reservations = ranges.remove(&row.id).unwrap_or_default();
        Ok(unit_response(row, reservations))
    }

    /// List units for the admin dashboard, each with its current and
    /// upcoming reservation ranges attached.
    pub async fn list(
        &self,
        query: &InventoryQuery,
        pagination: &Pagination,
    ) -> Result<Vec<InventoryItemResponse>, AppError> {
        let rows = InventoryItem::list(
            &self.pool,
            query.city.as_deref(),
            query.product.as_deref(),
            query.status,
            pagination,
        )
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut ranges = self.upcoming_ranges(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let reservations = ranges.remove(&row.id).unwrap_or_default();
                unit_response(row, reservations)
            })
            .collect())
    }

    async fn upcoming_ranges(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ReservationRangeResponse>>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut ranges: HashMap<Uuid, Vec<ReservationRangeResponse>> = HashMap::new();
        for reservation in Reservation::find_upcoming_for_items(&self.pool, ids).await? {
            ranges
                .entry(reservation.inventory_item_id)
                .or_default()
                .push(ReservationRangeResponse {
                    order_id: reservation.order_id,
                    start_date: reservation.start_date,
                    end_date: reservation.end_date,
                });
        }
        Ok(ranges)
    }
}

fn unit_response(
    row: InventoryUnitRow,
    reservations: Vec<ReservationRangeResponse>,
) -> InventoryItemResponse {
    InventoryItemResponse {
        id: row.id,
        sku: row.sku,
        city_slug: row.city_slug,
        product_slug: row.product_slug,
        status: row.status,
        reservations,
        created_at: row.created_at,
    }
}
