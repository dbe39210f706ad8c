use actix_web::{get, patch, post, web, HttpResponse, Result};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::services::BookingService;
use ooloo_shared::dto::{CancelOrderRequest, OrderLookupQuery, UpdateAddressRequest};

/// Customer order lookup. The requester proves ownership with the email
/// the order was placed under.
#[get("/orders/{order_id}")]
pub async fn get_order(
    order_id: web::Path<Uuid>,
    query: web::Query<OrderLookupQuery>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    debug!("Order lookup for {}", order_id);

    let order = booking_service.get_order(*order_id, &query.email).await?;

    Ok(HttpResponse::Ok().json(order))
}

/// Cancel an order, releasing its reserved units and restoring any
/// applied credit. Allowed until 48 hours before the delivery date.
#[post("/orders/{order_id}/cancel")]
pub async fn cancel_order(
    order_id: web::Path<Uuid>,
    request: web::Json<CancelOrderRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let order = booking_service.cancel_order(*order_id, &request).await?;

    info!("Order {} cancelled by customer", order_id);

    Ok(HttpResponse::Ok().json(order))
}

/// Change the delivery or return address on an order
#[patch("/orders/{order_id}/address")]
pub async fn update_address(
    order_id: web::Path<Uuid>,
    request: web::Json<UpdateAddressRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let order = booking_service.update_address(*order_id, &request).await?;

    Ok(HttpResponse::Ok().json(order))
}
