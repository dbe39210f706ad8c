use actix_web::{get, patch, post, web, HttpResponse, Result};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::Pagination;
use crate::services::{BookingService, InventoryService, PricingService};
use ooloo_shared::dto::{
    AdminOrdersQuery, AppendNoteRequest, CreatePromoCodeRequest, CreateUnitsRequest,
    InventoryQuery, UpdateFulfillmentRequest,
};

// Inventory

/// Mint a batch of sequentially numbered inventory units
#[post("/inventory/units")]
pub async fn create_units(
    request: web::Json<CreateUnitsRequest>,
    inventory_service: web::Data<InventoryService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let response = inventory_service.create_units(&request).await?;

    info!(
        "Created {} unit(s) of {} in {}",
        response.created, request.product_slug, request.city_slug
    );

    Ok(HttpResponse::Created().json(response))
}

/// Exclude a unit from new allocations
#[post("/inventory/units/{unit_id}/retire")]
pub async fn retire_unit(
    unit_id: web::Path<Uuid>,
    inventory_service: web::Data<InventoryService>,
) -> Result<HttpResponse, AppError> {
    let unit = inventory_service.retire(*unit_id).await?;

    Ok(HttpResponse::Ok().json(unit))
}

/// Return a retired unit to the allocatable pool
#[post("/inventory/units/{unit_id}/reactivate")]
pub async fn reactivate_unit(
    unit_id: web::Path<Uuid>,
    inventory_service: web::Data<InventoryService>,
) -> Result<HttpResponse, AppError> {
    let unit = inventory_service.reactivate(*unit_id).await?;

    Ok(HttpResponse::Ok().json(unit))
}

/// List inventory units with their upcoming reservation ranges
#[get("/inventory/units")]
pub async fn list_inventory(
    query: web::Query<InventoryQuery>,
    inventory_service: web::Data<InventoryService>,
) -> Result<HttpResponse, AppError> {
    let pagination = Pagination::page(query.page, query.per_page);
    let units = inventory_service.list(&query, &pagination).await?;

    Ok(HttpResponse::Ok().json(units))
}

// Orders

/// List orders newest first, optionally filtered by status
#[get("/orders")]
pub async fn list_orders(
    query: web::Query<AdminOrdersQuery>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    debug!("Admin order listing, status filter: {:?}", query.status);

    let orders = booking_service.list_orders(&query).await?;

    Ok(HttpResponse::Ok().json(orders))
}

/// Full order detail including payment reference and audit notes
#[get("/orders/{order_id}")]
pub async fn get_order(
    order_id: web::Path<Uuid>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let order = booking_service.get_order_admin(*order_id).await?;

    Ok(HttpResponse::Ok().json(order))
}

/// Drive an order through its fulfillment states
#[patch("/orders/{order_id}/status")]
pub async fn update_fulfillment(
    order_id: web::Path<Uuid>,
    request: web::Json<UpdateFulfillmentRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let order = booking_service.update_fulfillment(*order_id, &request).await?;

    Ok(HttpResponse::Ok().json(order))
}

/// Append a timestamped note to an order's audit log
#[post("/orders/{order_id}/notes")]
pub async fn append_note(
    order_id: web::Path<Uuid>,
    request: web::Json<AppendNoteRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let order = booking_service.append_note(*order_id, &request.note).await?;

    Ok(HttpResponse::Ok().json(order))
}

// Promo codes

/// Create a promo code
#[post("/promo-codes")]
pub async fn create_promo_code(
    request: web::Json<CreatePromoCodeRequest>,
    pricing_service: web::Data<PricingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let promo = pricing_service.create_promo(&request).await?;

    info!("Promo code {} created", promo.code);

    Ok(HttpResponse::Created().json(promo))
}
