use actix_web::{post, web, HttpResponse, Result};
use tracing::debug;
use validator::Validate;

use crate::error::AppError;
use crate::services::PricingService;
use ooloo_shared::dto::PromoValidateRequest;

/// Check a promo code against a rental subtotal without consuming it.
/// Rejections come back as structured reasons, not errors, so the booking
/// UI can show them inline.
#[post("/promos/validate")]
pub async fn validate_promo(
    request: web::Json<PromoValidateRequest>,
    pricing_service: web::Data<PricingService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    debug!("Validating promo code {}", request.code);

    let response = pricing_service.validate_promo(&request).await?;

    Ok(HttpResponse::Ok().json(response))
}
