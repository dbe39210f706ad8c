use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ooloo_backend::config::AppConfig;
use ooloo_backend::database::Database;
use ooloo_backend::error::AppError;
use ooloo_backend::handlers;
use ooloo_backend::middleware::AdminAuth;
use ooloo_backend::services::{
    AvailabilityService, BookingService, CatalogService, HttpPaymentGateway, InventoryService,
    NotificationService, PaymentService, PricingService,
};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Starting ooloo backend on {}:{}", config.host, config.port);

    // Initialize database and run migrations
    let database = Database::new(&config.database_url, config.max_db_connections).await?;
    database.migrate().await?;
    let pool = database.pool().clone();

    // Initialize services
    let catalog_service = CatalogService::new(pool.clone());
    let availability_service = AvailabilityService::new(pool.clone());
    let pricing_service = PricingService::new(pool.clone());
    let inventory_service = InventoryService::new(pool.clone());
    let payment_service = PaymentService::new(Arc::new(HttpPaymentGateway::new(
        config.payment_api_url.clone(),
        config.payment_api_key.clone(),
    )));
    let notification_service = NotificationService::new(
        config.notification_api_url.clone(),
        config.notification_api_key.clone(),
    );
    let booking_service = BookingService::new(
        pool.clone(),
        pricing_service.clone(),
        payment_service.clone(),
        notification_service.clone(),
    );

    booking_service.start_background_tasks(&config);

    let admin_api_key = config.admin_api_key.clone();
    let bind_addr = format!("{}:{}", config.host, config.port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(availability_service.clone()))
            .app_data(web::Data::new(pricing_service.clone()))
            .app_data(web::Data::new(inventory_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .service(
                web::scope("/api/v1")
                    .service(handlers::health::health_check)
                    .service(handlers::catalog::get_catalog)
                    .service(handlers::catalog::list_cities)
                    .service(handlers::availability::check_availability)
                    .service(handlers::checkout::quote)
                    .service(handlers::checkout::checkout)
                    .service(handlers::promos::validate_promo)
                    .service(handlers::orders::get_order)
                    .service(handlers::orders::cancel_order)
                    .service(handlers::orders::update_address)
                    .service(
                        web::scope("/admin")
                            .wrap(AdminAuth::new(admin_api_key.clone()))
                            .service(handlers::admin::create_units)
                            .service(handlers::admin::list_inventory)
                            .service(handlers::admin::retire_unit)
                            .service(handlers::admin::reactivate_unit)
                            .service(handlers::admin::list_orders)
                            .service(handlers::admin::get_order)
                            .service(handlers::admin::update_fulfillment)
                            .service(handlers::admin::append_note)
                            .service(handlers::admin::create_promo_code),
                    ),
            )
            .service(web::scope("/webhooks").service(handlers::webhooks::payment_webhook))
    })
    .bind(bind_addr)?
    .run()
    .await
    .map_err(AppError::from)
}
