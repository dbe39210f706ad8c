mod common;

use chrono::{Duration, NaiveDate, Utc};
use ooloo_backend::error::AppError;
use ooloo_backend::models::Order;
use ooloo_shared::dto::{
    AvailabilityRequest, CancelOrderRequest, CartItem, CheckoutRequest, PaymentWebhookEvent,
};
use ooloo_shared::types::{OrderStatus, PaymentOutcome, ReturnMethod};
use sqlx::PgPool;

use common::{
    availability_service, booking_service, booking_service_with_gateway, reset_booking_data,
    seed_units, test_pool, MockGateway,
};

fn future_dates(days_out: i64, length: i64) -> (NaiveDate, NaiveDate) {
    let delivery = Utc::now().date_naive() + Duration::days(days_out);
    (delivery, delivery + Duration::days(length))
}

fn checkout_request(
    email: &str,
    quantity: i32,
    delivery: NaiveDate,
    return_date: NaiveDate,
) -> CheckoutRequest {
    CheckoutRequest {
        first_name: "Avery".to_string(),
        last_name: "Brooks".to_string(),
        email: email.to_string(),
        phone: "512-555-0100".to_string(),
        city_slug: "austin".to_string(),
        delivery_date: delivery,
        return_date,
        delivery_window: "9am-12pm".to_string(),
        return_window: Some("9am-12pm".to_string()),
        delivery_address: "300 Congress Ave, Austin TX".to_string(),
        return_address: Some("300 Congress Ave, Austin TX".to_string()),
        return_method: ReturnMethod::Pickup,
        items: vec![CartItem {
            product_slug: "carryon".to_string(),
            quantity,
        }],
        addons: vec![],
        promo_code: None,
        referral_code: None,
    }
}

async fn reservation_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn checkout_reserves_units_and_returns_a_payment_token() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 3).await;

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let response = service
        .create_booking(&checkout_request("avery@example.com", 2, delivery, return_date))
        .await
        .unwrap();

    assert!(!response.payment_client_token.is_empty());
    assert_eq!(reservation_count(&pool).await, 2);

    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.payment_intent_id.is_some());
    assert_eq!(order.total_cents, response.pricing.total_cents);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn checkout_short_pool_reports_needed_and_available() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 1).await;

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let err = service
        .create_booking(&checkout_request("avery@example.com", 2, delivery, return_date))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientInventory {
            product,
            needed,
            available,
        } => {
            assert_eq!(product, "carryon");
            assert_eq!(needed, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientInventory, got {:?}", other),
    }

    // The rejected checkout must leave nothing behind
    assert_eq!(reservation_count(&pool).await, 0);
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn concurrent_checkouts_never_oversell() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 3).await;

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let handles: Vec<_> = ["first@example.com", "second@example.com"]
        .into_iter()
        .map(|email| {
            let service = service.clone();
            let request = checkout_request(email, 2, delivery, return_date);
            tokio::spawn(async move { service.create_booking(&request).await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();

    // Exactly one checkout wins the third unit race; the loser gets a
    // structured shortage or a retryable conflict, never a double-booking.
    assert_eq!(successes, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    AppError::InsufficientInventory { .. } | AppError::Conflict(_)
                ),
                "unexpected loser error: {:?}",
                err
            );
        }
    }
    assert_eq!(reservation_count(&pool).await, 2);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn payment_outcome_drives_the_order_state_machine() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 2).await;

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let response = service
        .create_booking(&checkout_request("avery@example.com", 1, delivery, return_date))
        .await
        .unwrap();
    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();
    let intent_id = order.payment_intent_id.unwrap();

    service
        .confirm_payment(&PaymentWebhookEvent {
            payment_intent_id: intent_id.clone(),
            outcome: PaymentOutcome::Succeeded,
        })
        .await
        .unwrap();
    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);

    // Duplicate delivery of the same outcome is acknowledged quietly
    service
        .confirm_payment(&PaymentWebhookEvent {
            payment_intent_id: intent_id,
            outcome: PaymentOutcome::Succeeded,
        })
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn success_event_the_provider_disowns_is_rejected() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 2).await;

    let service = booking_service_with_gateway(&pool, MockGateway::unpaid());
    let (delivery, return_date) = future_dates(30, 4);

    let response = service
        .create_booking(&checkout_request("avery@example.com", 1, delivery, return_date))
        .await
        .unwrap();
    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();

    let err = service
        .confirm_payment(&PaymentWebhookEvent {
            payment_intent_id: order.payment_intent_id.unwrap(),
            outcome: PaymentOutcome::Succeeded,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The order keeps waiting for a capture the provider actually stands by
    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(reservation_count(&pool).await, 1);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn payment_failure_releases_the_booking() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 2).await;

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let response = service
        .create_booking(&checkout_request("avery@example.com", 1, delivery, return_date))
        .await
        .unwrap();
    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();

    service
        .confirm_payment(&PaymentWebhookEvent {
            payment_intent_id: order.payment_intent_id.unwrap(),
            outcome: PaymentOutcome::Failed,
        })
        .await
        .unwrap();

    let order = Order::find_by_id(&pool, response.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(reservation_count(&pool).await, 0);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn gateway_outage_rolls_the_checkout_back() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 2).await;

    let service = booking_service_with_gateway(&pool, MockGateway::broken());
    let (delivery, return_date) = future_dates(30, 4);

    let err = service
        .create_booking(&checkout_request("avery@example.com", 1, delivery, return_date))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));

    // The compensating cancellation must have freed the units again
    assert_eq!(reservation_count(&pool).await, 0);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn cancellation_frees_units_and_restores_credit() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 2).await;

    sqlx::query(
        "INSERT INTO customers (email, first_name, last_name, phone, referral_code, referral_credit_cents)
         VALUES ('avery@example.com', 'Avery', 'Brooks', '512-555-0100', 'AVERY123', 500)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let response = service
        .create_booking(&checkout_request("avery@example.com", 1, delivery, return_date))
        .await
        .unwrap();
    assert_eq!(response.pricing.credit_applied_cents, 500);

    let balance: i64 = sqlx::query_scalar(
        "SELECT referral_credit_cents FROM customers WHERE email = 'avery@example.com'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(balance, 0);

    let cancelled = service
        .cancel_order(
            response.order_id,
            &CancelOrderRequest {
                email: "avery@example.com".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(reservation_count(&pool).await, 0);

    let balance: i64 = sqlx::query_scalar(
        "SELECT referral_credit_cents FROM customers WHERE email = 'avery@example.com'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(balance, 500);

    // A second cancellation attempt hits the terminal-state guard
    let err = service
        .cancel_order(
            response.order_id,
            &CancelOrderRequest {
                email: "avery@example.com".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn booking_a_set_draws_from_both_component_pools() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 2).await;
    seed_units(&pool, "austin", "large", 2).await;

    let service = booking_service(&pool);
    let availability = availability_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let mut request = checkout_request("avery@example.com", 1, delivery, return_date);
    request.items = vec![CartItem {
        product_slug: "set".to_string(),
        quantity: 1,
    }];
    service.create_booking(&request).await.unwrap();

    assert_eq!(reservation_count(&pool).await, 2);

    let remaining = availability
        .check(&AvailabilityRequest {
            city_slug: "austin".to_string(),
            product_slug: "set".to_string(),
            start_date: delivery,
            end_date: return_date,
        })
        .await
        .unwrap();
    assert_eq!(remaining.available, 1);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn availability_treats_touching_ranges_as_overlapping() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 1).await;

    let service = booking_service(&pool);
    let availability = availability_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    service
        .create_booking(&checkout_request("avery@example.com", 1, delivery, return_date))
        .await
        .unwrap();

    let touching = availability
        .check(&AvailabilityRequest {
            city_slug: "austin".to_string(),
            product_slug: "carryon".to_string(),
            start_date: return_date,
            end_date: return_date + Duration::days(2),
        })
        .await
        .unwrap();
    assert_eq!(touching.available, 0);

    let clear = availability
        .check(&AvailabilityRequest {
            city_slug: "austin".to_string(),
            product_slug: "carryon".to_string(),
            start_date: return_date + Duration::days(1),
            end_date: return_date + Duration::days(3),
        })
        .await
        .unwrap();
    assert_eq!(clear.available, 1);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database (TEST_DATABASE_URL)"]
async fn promo_usage_is_consumed_only_by_committed_checkouts() {
    let pool = test_pool().await;
    reset_booking_data(&pool).await;
    seed_units(&pool, "austin", "carryon", 4).await;

    sqlx::query(
        "INSERT INTO promo_codes (code, discount_type, discount_value, usage_limit)
         VALUES ('ONETIME', 'percent', 10, 1)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let service = booking_service(&pool);
    let (delivery, return_date) = future_dates(30, 4);

    let mut request = checkout_request("first@example.com", 1, delivery, return_date);
    request.promo_code = Some("ONETIME".to_string());
    let response = service.create_booking(&request).await.unwrap();
    assert!(response.pricing.promo_discount_cents > 0);

    let mut request = checkout_request("second@example.com", 1, delivery, return_date);
    request.promo_code = Some("ONETIME".to_string());
    let err = service.create_booking(&request).await.unwrap_err();
    match err {
        AppError::Conflict(message) => {
            assert!(message.contains("usage_limit_reached"), "got: {}", message)
        }
        other => panic!("expected Conflict, got {:?}", other),
    }
}
