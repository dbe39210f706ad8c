use chrono::{DateTime, NaiveDate, Utc};
use ooloo_shared::pricing::PriceBreakdown;
use ooloo_shared::types::{Cents, OrderStatus, ReturnMethod};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Pagination;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city_id: Uuid,
    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub delivery_window: String,
    pub return_window: Option<String>,
    pub delivery_address: String,
    pub return_address: Option<String>,
    pub return_method: ReturnMethod,
    pub rental_subtotal_cents: Cents,
    pub addons_subtotal_cents: Cents,
    pub subtotal_cents: Cents,
    pub early_bird_discount_cents: Cents,
    pub promo_discount_cents: Cents,
    pub referral_discount_cents: Cents,
    pub credit_applied_cents: Cents,
    pub discount_total_cents: Cents,
    pub delivery_fee_cents: Cents,
    pub ship_back_fee_cents: Cents,
    pub rush_fee_cents: Cents,
    pub tax_cents: Cents,
    pub total_cents: Cents,
    pub promo_code_id: Option<Uuid>,
    pub referral_code_used: Option<String>,
    pub payment_intent_id: Option<String>,
    pub admin_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert a pending order at checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city_id: Uuid,
    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub delivery_window: String,
    pub return_window: Option<String>,
    pub delivery_address: String,
    pub return_address: Option<String>,
    pub return_method: ReturnMethod,
    pub pricing: PriceBreakdown,
    pub promo_code_id: Option<Uuid>,
    pub referral_code_used: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_slug: String,
    pub product_name: String,
    pub quantity: i32,
    pub daily_rate_cents: Cents,
    pub days: i32,
    pub line_total_cents: Cents,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderAddon {
    pub id: Uuid,
    pub order_id: Uuid,
    pub addon_id: Uuid,
    pub addon_slug: String,
    pub addon_name: String,
    pub quantity: i32,
    pub price_cents: Cents,
    pub line_total_cents: Cents,
}

/// Compact listing row for the admin order table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderSummaryRow {
    pub id: Uuid,
    pub status: OrderStatus,
    pub email: String,
    pub city_slug: String,
    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub total_cents: Cents,
    pub created_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, customer_id, status, first_name, last_name, email, phone, \
    city_id, delivery_date, return_date, delivery_window, return_window, delivery_address, \
    return_address, return_method, rental_subtotal_cents, addons_subtotal_cents, subtotal_cents, \
    early_bird_discount_cents, promo_discount_cents, referral_discount_cents, \
    credit_applied_cents, discount_total_cents, delivery_fee_cents, ship_back_fee_cents, \
    rush_fee_cents, tax_cents, total_cents, promo_code_id, referral_code_used, \
    payment_intent_id, admin_notes, created_at, updated_at";

impl Order {
    /// Insert a pending order with its full monetary breakdown snapshotted.
    pub async fn insert(conn: &mut PgConnection, new: &NewOrder) -> Result<Self, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (
                customer_id, first_name, last_name, email, phone, city_id,
                delivery_date, return_date, delivery_window, return_window,
                delivery_address, return_address, return_method,
                rental_subtotal_cents, addons_subtotal_cents, subtotal_cents,
                early_bird_discount_cents, promo_discount_cents, referral_discount_cents,
                credit_applied_cents, discount_total_cents, delivery_fee_cents,
                ship_back_fee_cents, rush_fee_cents, tax_cents, total_cents,
                promo_code_id, referral_code_used
             ) VALUES (
                $1, $2, $3, LOWER($4), $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                $27, $28
             )
             RETURNING {ORDER_COLUMNS}",
        ))
        .bind(new.customer_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.city_id)
        .bind(new.delivery_date)
        .bind(new.return_date)
        .bind(&new.delivery_window)
        .bind(&new.return_window)
        .bind(&new.delivery_address)
        .bind(&new.return_address)
        .bind(new.return_method)
        .bind(new.pricing.rental_subtotal_cents)
        .bind(new.pricing.addons_subtotal_cents)
        .bind(new.pricing.subtotal_cents)
        .bind(new.pricing.early_bird_discount_cents)
        .bind(new.pricing.promo_discount_cents)
        .bind(new.pricing.referral_discount_cents)
        .bind(new.pricing.credit_applied_cents)
        .bind(new.pricing.discount_total_cents)
        .bind(new.pricing.delivery_fee_cents)
        .bind(new.pricing.ship_back_fee_cents)
        .bind(new.pricing.rush_fee_cents)
        .bind(new.pricing.tax_cents)
        .bind(new.pricing.total_cents)
        .bind(new.promo_code_id)
        .bind(&new.referral_code_used)
        .fetch_one(conn)
        .await?;

        Ok(order)
    }

    /// Find an order by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Find an order by ID, but only if it belongs to this email. Used by
    /// customer-facing lookups so one customer cannot read another's order.
    pub async fn find_for_customer(
        pool: &PgPool,
        id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE id = $1 AND LOWER(email) = LOWER($2)",
        ))
        .bind(id)
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Find the order owning a payment intent
    pub async fn find_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = $1",
        ))
        .bind(payment_intent_id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// List orders newest first, optionally filtered by status
    pub async fn list_summaries(
        pool: &PgPool,
        status: Option<OrderStatus>,
        pagination: &Pagination,
    ) -> Result<Vec<OrderSummaryRow>, AppError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            "SELECT o.id, o.status, o.email, c.slug AS city_slug,
                    o.delivery_date, o.return_date, o.total_cents, o.created_at
             FROM orders o
             JOIN cities c ON c.id = o.city_id
             WHERE ($1::order_status IS NULL OR o.status = $1)
             ORDER BY o.created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Pending orders created before `cutoff`, for the abandonment sweep
    pub async fn find_pending_older_than(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Self>, AppError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE status = 'pending' AND created_at < $1
             ORDER BY created_at",
        ))
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    /// Flip a non-terminal order to cancelled in one guarded statement.
    /// Returns None when the order is missing or already terminal, so a
    /// second cancellation attempt is rejected rather than silently
    /// repeated.
    pub async fn cancel_if_active(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = 'cancelled', updated_at = NOW()
             WHERE id = $1 AND status NOT IN ('cancelled', 'returned')
             RETURNING {ORDER_COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(order)
    }

    /// Confirm an order, but only while it is still pending. The status
    /// guard keeps a late payment webhook from resurrecting an order the
    /// sweep or the customer cancelled in the meantime.
    pub async fn confirm_if_pending(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = 'confirmed', updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {ORDER_COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Set the order status. Fulfillment transitions are validated by the
    /// caller; terminal states never pass this guard.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status NOT IN ('cancelled', 'returned')
             RETURNING {ORDER_COLUMNS}",
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Attach the payment intent created for this order
    pub async fn set_payment_intent(
        pool: &PgPool,
        id: Uuid,
        payment_intent_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE orders SET payment_intent_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(payment_intent_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Replace the delivery or return address
    pub async fn update_address(
        pool: &PgPool,
        id: Uuid,
        field: ooloo_shared::types::AddressField,
        new_address: &str,
    ) -> Result<Option<Self>, AppError> {
        let query = match field {
            ooloo_shared::types::AddressField::Delivery => format!(
                "UPDATE orders SET delivery_address = $2, updated_at = NOW()
                 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
            ),
            ooloo_shared::types::AddressField::Return => format!(
                "UPDATE orders SET return_address = $2, updated_at = NOW()
                 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
            ),
        };
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(new_address)
            .fetch_optional(pool)
            .await?;

        Ok(order)
    }

    /// Append a timestamped line to the order's audit notes
    pub async fn append_admin_note(pool: &PgPool, id: Uuid, note: &str) -> Result<Option<Self>, AppError> {
        let line = format!("[{}] {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"), note);
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET admin_notes = admin_notes || $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}",
        ))
        .bind(id)
        .bind(line)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// The stored monetary breakdown, reassembled. Re-deriving the total
    /// from these fields must reproduce `total_cents` exactly.
    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            rental_subtotal_cents: self.rental_subtotal_cents,
            addons_subtotal_cents: self.addons_subtotal_cents,
            subtotal_cents: self.subtotal_cents,
            early_bird_discount_cents: self.early_bird_discount_cents,
            promo_discount_cents: self.promo_discount_cents,
            referral_discount_cents: self.referral_discount_cents,
            credit_applied_cents: self.credit_applied_cents,
            discount_total_cents: self.discount_total_cents,
            delivery_fee_cents: self.delivery_fee_cents,
            ship_back_fee_cents: self.ship_back_fee_cents,
            rush_fee_cents: self.rush_fee_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
        }
    }
}

impl OrderItem {
    /// Insert one line item with the rate snapshotted at booking time
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        conn: &mut PgConnection,
        order_id: Uuid,
        product_id: Uuid,
        product_slug: &str,
        product_name: &str,
        quantity: i32,
        daily_rate_cents: Cents,
        days: i32,
    ) -> Result<Self, AppError> {
        let line_total = Cents::from(quantity) * daily_rate_cents * Cents::from(days);
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items
                (order_id, product_id, product_slug, product_name, quantity,
                 daily_rate_cents, days, line_total_cents)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, order_id, product_id, product_slug, product_name,
                       quantity, daily_rate_cents, days, line_total_cents",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(product_slug)
        .bind(product_name)
        .bind(quantity)
        .bind(daily_rate_cents)
        .bind(days)
        .bind(line_total)
        .fetch_one(conn)
        .await?;

        Ok(item)
    }

    /// Line items for an order
    pub async fn for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<Self>, AppError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, product_slug, product_name,
                    quantity, daily_rate_cents, days, line_total_cents
             FROM order_items WHERE order_id = $1
             ORDER BY product_slug",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}

impl OrderAddon {
    /// Insert one addon line with the price snapshotted at booking time
    pub async fn insert(
        conn: &mut PgConnection,
        order_id: Uuid,
        addon_id: Uuid,
        addon_slug: &str,
        addon_name: &str,
        quantity: i32,
        price_cents: Cents,
    ) -> Result<Self, AppError> {
        let line_total = Cents::from(quantity) * price_cents;
        let addon = sqlx::query_as::<_, OrderAddon>(
            "INSERT INTO order_addons
                (order_id, addon_id, addon_slug, addon_name, quantity, price_cents, line_total_cents)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, order_id, addon_id, addon_slug, addon_name,
                       quantity, price_cents, line_total_cents",
        )
        .bind(order_id)
        .bind(addon_id)
        .bind(addon_slug)
        .bind(addon_name)
        .bind(quantity)
        .bind(price_cents)
        .fetch_one(conn)
        .await?;

        Ok(addon)
    }

    /// Addon lines for an order
    pub async fn for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<Self>, AppError> {
        let addons = sqlx::query_as::<_, OrderAddon>(
            "SELECT id, order_id, addon_id, addon_slug, addon_name,
                    quantity, price_cents, line_total_cents
             FROM order_addons WHERE order_id = $1
             ORDER BY addon_slug",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;

        Ok(addons)
    }
}
