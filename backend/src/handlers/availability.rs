use actix_web::{get, web, HttpResponse, Result};
use tracing::debug;
use validator::Validate;

use crate::error::AppError;
use crate::services::AvailabilityService;
use ooloo_shared::dto::AvailabilityRequest;

/// How many units of a product are free in a city for a date range
#[get("/availability")]
pub async fn check_availability(
    query: web::Query<AvailabilityRequest>,
    availability_service: web::Data<AvailabilityService>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    debug!(
        "Availability check for {} / {} from {} to {}",
        query.city_slug, query.product_slug, query.start_date, query.end_date
    );

    let response = availability_service.check(&query).await?;

    Ok(HttpResponse::Ok().json(response))
}
