use actix_web::http::header;
use actix_web::{test, web, App, HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde_json::{json, Value};
use validator::Validate;

use ooloo_backend::error::AppError;
use ooloo_backend::middleware::AdminAuth;
use ooloo_shared::dto::{CartItem, CheckoutRequest, PaymentWebhookEvent};
use ooloo_shared::types::{PaymentOutcome, ReturnMethod};

async fn body_json(response: HttpResponse) -> Value {
    let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[actix_web::test]
async fn insufficient_inventory_reports_the_shortage() {
    let err = AppError::InsufficientInventory {
        product: "carryon".to_string(),
        needed: 3,
        available: 1,
    };

    let response = err.error_response();
    assert_eq!(response.status(), 409);

    let body = body_json(response).await;
    assert_eq!(body["error"], "insufficient_inventory");
    assert_eq!(body["product"], "carryon");
    assert_eq!(body["needed"], 3);
    assert_eq!(body["available"], 1);
}

#[actix_web::test]
async fn validation_errors_map_to_bad_request() {
    let response = AppError::Validation("return_date must be on or after delivery_date".to_string())
        .error_response();
    assert_eq!(response.status(), 400);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "return_date must be on or after delivery_date");
}

#[actix_web::test]
async fn upstream_failures_map_to_bad_gateway() {
    let response = AppError::Upstream("gateway timed out".to_string()).error_response();
    assert_eq!(response.status(), 502);

    let body = body_json(response).await;
    assert_eq!(body["error"], "upstream_error");
}

#[actix_web::test]
async fn internal_errors_do_not_leak_details() {
    let response =
        AppError::Internal("set missing component row carryon".to_string()).error_response();
    assert_eq!(response.status(), 500);

    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_server_error");
    assert_eq!(body["message"], "An internal server error occurred");
}

#[core::prelude::v1::test]
fn field_validation_failures_collect_into_one_message() {
    let request = CheckoutRequest {
        first_name: "Avery".to_string(),
        last_name: "Brooks".to_string(),
        email: "not-an-email".to_string(),
        phone: "512-555-0100".to_string(),
        city_slug: String::new(),
        delivery_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        return_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
        delivery_window: "9am-12pm".to_string(),
        return_window: Some("9am-12pm".to_string()),
        delivery_address: "300 Congress Ave, Austin TX".to_string(),
        return_address: Some("300 Congress Ave, Austin TX".to_string()),
        return_method: ReturnMethod::Pickup,
        items: vec![CartItem {
            product_slug: "carryon".to_string(),
            quantity: 1,
        }],
        addons: vec![],
        promo_code: None,
        referral_code: None,
    };

    let err = AppError::from(request.validate().unwrap_err());
    match err {
        AppError::Validation(message) => {
            assert!(message.contains("email"), "got: {}", message);
            assert!(message.contains("city_slug"), "got: {}", message);
        }
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[core::prelude::v1::test]
fn webhook_events_deserialize_from_gateway_json() {
    let event: PaymentWebhookEvent =
        serde_json::from_value(json!({"payment_intent_id": "pi_123", "outcome": "succeeded"}))
            .unwrap();
    assert_eq!(event.payment_intent_id, "pi_123");
    assert_eq!(event.outcome, PaymentOutcome::Succeeded);

    let event: PaymentWebhookEvent =
        serde_json::from_value(json!({"payment_intent_id": "pi_456", "outcome": "failed"}))
            .unwrap();
    assert_eq!(event.outcome, PaymentOutcome::Failed);

    let unknown =
        serde_json::from_value::<PaymentWebhookEvent>(json!({"payment_intent_id": "pi_789", "outcome": "voided"}));
    assert!(unknown.is_err());
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(json!({"pong": true}))
}

#[actix_web::test]
async fn admin_scope_rejects_requests_without_a_key() {
    let app = test::init_service(
        App::new().service(
            web::scope("/admin")
                .wrap(AdminAuth::new("sekret"))
                .route("/ping", web::get().to(ping)),
        ),
    )
    .await;

    let request = test::TestRequest::get().uri("/admin/ping").to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 401);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[actix_web::test]
async fn admin_scope_rejects_a_wrong_key() {
    let app = test::init_service(
        App::new().service(
            web::scope("/admin")
                .wrap(AdminAuth::new("sekret"))
                .route("/ping", web::get().to(ping)),
        ),
    )
    .await;

    let request = test::TestRequest::get()
        .uri("/admin/ping")
        .insert_header((header::AUTHORIZATION, "Bearer wrong"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 401);
}

#[actix_web::test]
async fn admin_scope_passes_a_valid_key_through() {
    let app = test::init_service(
        App::new().service(
            web::scope("/admin")
                .wrap(AdminAuth::new("sekret"))
                .route("/ping", web::get().to(ping)),
        ),
    )
    .await;

    let request = test::TestRequest::get()
        .uri("/admin/ping")
        .insert_header((header::AUTHORIZATION, "Bearer sekret"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 200);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["pong"], true);
}
