use actix_web::{post, web, HttpResponse, Result};
use tracing::{debug, info};
use validator::Validate;

use crate::error::AppError;
use crate::services::{BookingService, PricingService};
use ooloo_shared::dto::{CheckoutRequest, QuoteRequest};

/// Price a cart without committing anything. The booking UI calls this on
/// every cart or date change.
#[post("/quote")]
pub async fn quote(
    request: web::Json<QuoteRequest>,
    pricing_service: web::Data<PricingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    debug!(
        "Quoting {} item line(s) for {} from {} to {}",
        request.items.len(),
        request.city_slug,
        request.delivery_date,
        request.return_date
    );

    let response = pricing_service.quote(&request).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Commit a booking: price the cart server-side, create the order, and
/// reserve inventory units atomically. Returns the payment client token
/// the UI needs to collect payment.
#[post("/checkout")]
pub async fn checkout(
    request: web::Json<CheckoutRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    debug!(
        "Checkout for {} in {} from {} to {}",
        request.email, request.city_slug, request.delivery_date, request.return_date
    );

    let response = booking_service.create_booking(&request).await?;

    info!(
        "Order {} created for {} - total {} cents",
        response.order_id, request.email, response.pricing.total_cents
    );

    Ok(HttpResponse::Created().json(response))
}
