use super::*;
use chrono::{NaiveDate, TimeZone};

fn product(slug: &str, daily_rate_cents: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: slug.to_string(),
        daily_rate_cents,
        active: true,
        sort_order: 0,
        created_at: Utc::now(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn expand_cart_passes_plain_items_through() {
    let medium = product("medium", 895);
    let requirements = expand_cart(&[(medium.clone(), 3)], None).unwrap();

    assert_eq!(requirements.len(), 1);
    assert_eq!(requirements[0].product_id, medium.id);
    assert_eq!(requirements[0].needed, 3);
}

#[test]
fn expand_cart_splits_sets_into_components() {
    let set = product("set", 1495);
    let carryon = product("carryon", 695);
    let large = product("large", 995);

    let requirements =
        expand_cart(&[(set, 2)], Some(&(carryon.clone(), large.clone()))).unwrap();

    assert_eq!(requirements.len(), 2);
    assert_eq!(requirements[0].slug, "carryon");
    assert_eq!(requirements[0].needed, 2);
    assert_eq!(requirements[1].slug, "large");
    assert_eq!(requirements[1].needed, 2);
}

#[test]
fn expand_cart_merges_sets_with_explicit_lines() {
    let set = product("set", 1495);
    let carryon = product("carryon", 695);
    let large = product("large", 995);

    let requirements = expand_cart(
        &[(carryon.clone(), 1), (set, 1)],
        Some(&(carryon.clone(), large)),
    )
    .unwrap();

    let carryon_req = requirements
        .iter()
        .find(|r| r.product_id == carryon.id)
        .unwrap();
    assert_eq!(carryon_req.needed, 2);
    let large_req = requirements.iter().find(|r| r.slug == "large").unwrap();
    assert_eq!(large_req.needed, 1);
}

#[test]
fn expand_cart_orders_pools_by_slug() {
    let zipper = product("zipper-tote", 495);
    let carryon = product("carryon", 695);
    let requirements = expand_cart(&[(zipper, 1), (carryon, 1)], None).unwrap();

    let slugs: Vec<&str> = requirements.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["carryon", "zipper-tote"]);
}

#[test]
fn expand_cart_requires_components_for_sets() {
    let set = product("set", 1495);
    let result = expand_cart(&[(set, 1)], None);
    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[test]
fn cancellation_allowed_at_exactly_the_cutoff() {
    let now = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
    assert!(cancellation_window_open(now, date(2026, 3, 10)));
}

#[test]
fn cancellation_rejected_one_minute_past_the_cutoff() {
    let now = Utc.with_ymd_and_hms(2026, 3, 8, 0, 1, 0).unwrap();
    assert!(!cancellation_window_open(now, date(2026, 3, 10)));
}

#[test]
fn address_change_allowed_at_exactly_the_cutoff() {
    let now = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    assert!(address_window_open(now, date(2026, 3, 10)));
}

#[test]
fn address_change_rejected_inside_the_cutoff() {
    let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
    assert!(!address_window_open(now, date(2026, 3, 10)));
}

#[test]
fn fulfillment_accepts_forward_progress() {
    assert!(validate_fulfillment_target(
        OrderStatus::Confirmed,
        OrderStatus::OutForDelivery,
        ReturnMethod::Pickup,
    )
    .is_ok());
    assert!(validate_fulfillment_target(
        OrderStatus::Delivered,
        OrderStatus::OutForPickup,
        ReturnMethod::Pickup,
    )
    .is_ok());
    assert!(validate_fulfillment_target(
        OrderStatus::Delivered,
        OrderStatus::Returned,
        ReturnMethod::Ship,
    )
    .is_ok());
}

#[test]
fn fulfillment_rejects_terminal_orders() {
    let result = validate_fulfillment_target(
        OrderStatus::Cancelled,
        OrderStatus::Delivered,
        ReturnMethod::Pickup,
    );
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let result = validate_fulfillment_target(
        OrderStatus::Returned,
        OrderStatus::Delivered,
        ReturnMethod::Pickup,
    );
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[test]
fn fulfillment_rejects_pending_and_cancelled_targets() {
    let result = validate_fulfillment_target(
        OrderStatus::Confirmed,
        OrderStatus::Pending,
        ReturnMethod::Pickup,
    );
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = validate_fulfillment_target(
        OrderStatus::Confirmed,
        OrderStatus::Cancelled,
        ReturnMethod::Pickup,
    );
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn fulfillment_rejects_pickup_leg_for_ship_back_orders() {
    let result = validate_fulfillment_target(
        OrderStatus::Delivered,
        OrderStatus::OutForPickup,
        ReturnMethod::Ship,
    );
    assert!(matches!(result, Err(AppError::Validation(_))));
}
