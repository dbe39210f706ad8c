use actix_web::{get, web, HttpResponse, Result};
use serde_json::json;

use crate::database::Database;

#[get("/health")]
pub async fn health_check(database: web::Data<Database>) -> Result<HttpResponse> {
    let database_ok = database.health_check().await.is_ok();
    let status = if database_ok { "healthy" } else { "degraded" };

    Ok(HttpResponse::Ok().json(json!({
        "status": status,
        "service": "ooloo-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database_ok
    })))
}
