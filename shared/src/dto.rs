use crate::pricing::PriceBreakdown;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Catalog DTOs
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CityResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub tax_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub daily_rate_cents: Cents,
    pub sort_order: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddonResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub price_cents: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub city: CityResponse,
    pub products: Vec<ProductResponse>,
    pub addons: Vec<AddonResponse>,
}

// Availability DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AvailabilityRequest {
    #[validate(length(min = 1))]
    pub city_slug: String,

    #[validate(length(min = 1))]
    pub product_slug: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub product_slug: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: i64,
}

// Quote / checkout DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItem {
    #[validate(length(min = 1))]
    pub product_slug: String,

    #[validate(range(min = 1, max = 20))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartAddon {
    #[validate(length(min = 1))]
    pub addon_slug: String,

    #[validate(range(min = 1, max = 20))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct QuoteRequest {
    #[validate(length(min = 1))]
    pub city_slug: String,

    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub return_method: ReturnMethod,

    #[validate(length(min = 1))]
    pub items: Vec<CartItem>,

    pub addons: Vec<CartAddon>,

    #[validate(length(min = 1, max = 40))]
    pub promo_code: Option<String>,

    #[validate(length(min = 1, max = 40))]
    pub referral_code: Option<String>,

    #[validate(email)]
    pub customer_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub days: i64,
    pub pricing: PriceBreakdown,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 7, max = 20))]
    pub phone: String,

    #[validate(length(min = 1))]
    pub city_slug: String,

    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,

    #[validate(length(min = 1, max = 50))]
    pub delivery_window: String,

    #[validate(length(min = 1, max = 50))]
    pub return_window: Option<String>,

    #[validate(length(min = 5, max = 500))]
    pub delivery_address: String,

    #[validate(length(min = 5, max = 500))]
    pub return_address: Option<String>,

    pub return_method: ReturnMethod,

    #[validate(length(min = 1))]
    pub items: Vec<CartItem>,

    pub addons: Vec<CartAddon>,

    #[validate(length(min = 1, max = 40))]
    pub promo_code: Option<String>,

    #[validate(length(min = 1, max = 40))]
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub payment_client_token: String,
    pub pricing: PriceBreakdown,
}

// Order DTOs
#[derive(Debug, Deserialize, Validate)]
pub struct OrderLookupQuery {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub product_slug: String,
    pub product_name: String,
    pub quantity: i32,
    pub daily_rate_cents: Cents,
    pub days: i32,
    pub line_total_cents: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderAddonResponse {
    pub addon_slug: String,
    pub addon_name: String,
    pub quantity: i32,
    pub price_cents: Cents,
    pub line_total_cents: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: OrderStatus,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city_slug: String,
    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub delivery_window: String,
    pub return_window: Option<String>,
    pub delivery_address: String,
    pub return_address: Option<String>,
    pub return_method: ReturnMethod,
    pub items: Vec<OrderItemResponse>,
    pub addons: Vec<OrderAddonResponse>,
    pub pricing: PriceBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub status: OrderStatus,
    pub email: String,
    pub city_slug: String,
    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub total_cents: Cents,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CancelOrderRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateAddressRequest {
    #[validate(email)]
    pub email: String,

    pub field: AddressField,

    #[validate(length(min = 5, max = 500))]
    pub new_address: String,
}

// Promo DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PromoValidateRequest {
    #[validate(length(min = 1, max = 40))]
    pub code: String,

    #[validate(range(min = 0))]
    pub rental_subtotal_cents: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromoValidateResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<PromoRejection>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePromoCodeRequest {
    #[validate(length(min = 3, max = 40))]
    pub code: String,

    pub discount_type: DiscountType,

    #[validate(range(min = 1))]
    pub discount_value: i64,

    #[validate(range(min = 0))]
    pub min_order_total_cents: Option<i64>,

    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,

    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromoCodeResponse {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_total_cents: Option<Cents>,
    pub usage_limit: Option<i32>,
    pub times_used: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// Inventory DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateUnitsRequest {
    #[validate(length(min = 1))]
    pub city_slug: String,

    #[validate(length(min = 1))]
    pub product_slug: String,

    #[validate(range(min = 1, max = 500))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUnitsResponse {
    pub created: i32,
    pub skus: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub city: Option<String>,
    pub product: Option<String>,
    pub status: Option<InventoryStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationRangeResponse {
    pub order_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub sku: String,
    pub city_slug: String,
    pub product_slug: String,
    pub status: InventoryStatus,
    pub reservations: Vec<ReservationRangeResponse>,
    pub created_at: DateTime<Utc>,
}

// Admin order DTOs
#[derive(Debug, Deserialize)]
pub struct AdminOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFulfillmentRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AppendNoteRequest {
    #[validate(length(min = 1, max = 2000))]
    pub note: String,
}

// Payment webhook DTOs
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    pub payment_intent_id: String,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}
