use actix_web::{get, web, HttpResponse, Result};
use tracing::debug;

use crate::error::AppError;
use crate::services::CatalogService;
use ooloo_shared::dto::CatalogQuery;

/// City catalog: products, addons, and the tax context the booking UI
/// prices against
#[get("/catalog")]
pub async fn get_catalog(
    query: web::Query<CatalogQuery>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    debug!("Serving catalog for city {}", query.city);

    let catalog = catalog_service.catalog(&query.city).await?;

    Ok(HttpResponse::Ok().json(catalog))
}

/// Active cities for the city picker
#[get("/catalog/cities")]
pub async fn list_cities(
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let cities = catalog_service.cities().await?;

    Ok(HttpResponse::Ok().json(cities))
}
