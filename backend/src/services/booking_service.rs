use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{is_retryable_conflict, AppError};
use crate::models::{
    City, Customer, NewOrder, Order, OrderAddon, OrderItem, Pagination, Product, PromoCode,
    Reservation,
};
use crate::services::pricing_service::{
    rental_subtotal, validate_referral, AppliedCode, PricingService,
};
use crate::services::{NotificationService, PaymentService};
use ooloo_shared::constants::{
    ADDRESS_CHANGE_CUTOFF_HOURS, CANCELLATION_CUTOFF_HOURS, CARRYON_SLUG, LARGE_SLUG,
    REFERRAL_REWARD_CENTS,
};
use ooloo_shared::dates::{days_until, hours_until, rental_days};
use ooloo_shared::dto::{
    AdminOrdersQuery, CancelOrderRequest, CheckoutRequest, CheckoutResponse, OrderAddonResponse,
    OrderItemResponse, OrderResponse, OrderSummaryResponse, PaymentWebhookEvent,
    UpdateAddressRequest, UpdateFulfillmentRequest,
};
use ooloo_shared::pricing::{self, AddonLine, QuoteInput, RentalLine};
use ooloo_shared::types::{AddressField, OrderStatus, PaymentOutcome, ReturnMethod};

#[cfg(test)]
mod tests;

/// Orchestrates the checkout commit and the order lifecycle. The commit is
/// the only place reservations are created; cancellation is the only place
/// they are released.
#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
    pricing_service: PricingService,
    payment_service: PaymentService,
    notification_service: NotificationService,
}

/// How many units a checkout needs from one physical pool, after composite
/// products have been expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PoolRequirement {
    pub product_id: Uuid,
    pub slug: String,
    pub needed: i64,
}

impl BookingService {
    pub fn new(
        pool: PgPool,
        pricing_service: PricingService,
        payment_service: PaymentService,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            pool,
            pricing_service,
            payment_service,
            notification_service,
        }
    }

    /// Checkout commit. Re-validates everything the booking UI showed
    /// earlier (stock can change across the payment round-trip), prices the
    /// cart from catalog rows, writes the order, and allocates inventory
    /// units, all inside one serializable transaction. Either every
    /// requested unit is reserved or nothing is written.
    pub async fn create_booking(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, AppError> {
        if request.return_date < request.delivery_date {
            return Err(AppError::Validation(
                "return_date must be on or after delivery_date".to_string(),
            ));
        }
        let now = Utc::now();
        let days_until_delivery = days_until(now, request.delivery_date);
        if days_until_delivery < 0 {
            return Err(AppError::Validation(
                "delivery_date is in the past".to_string(),
            ));
        }
        if request.return_method == ReturnMethod::Pickup && request.return_window.is_none() {
            return Err(AppError::Validation(
                "return_window is required when a driver picks the bags up".to_string(),
            ));
        }

        let city = City::find_by_slug(&self.pool, &request.city_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown city: {}", request.city_slug)))?;
        let cart = self
            .pricing_service
            .resolve_cart(&request.items, &request.addons)
            .await?;
        let days = rental_days(request.delivery_date, request.return_date);
        let subtotal = rental_subtotal(&cart, days);

        let set_components = if cart.items.iter().any(|(product, _)| product.is_set()) {
            Some(self.load_set_components().await?)
        } else {
            None
        };
        let requirements = expand_cart(&cart.items, set_components.as_ref())?;

        let mut tx = self.pool.begin().await?;
        // Serializable closes the read-then-allocate race between
        // concurrent checkouts; the exclusion constraint on reservations
        // backstops it at the storage level.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let customer = Customer::upsert_for_checkout(
            &mut tx,
            &request.email,
            &request.first_name,
            &request.last_name,
            &request.phone,
        )
        .await?;

        let applied = match (request.promo_code.as_deref(), request.referral_code.as_deref()) {
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "A promo code and a referral code cannot be combined".to_string(),
                ));
            }
            (Some(code), None) => {
                let promo = PromoCode::lock_by_code(&mut tx, code).await?.ok_or_else(|| {
                    AppError::Conflict("Promo code rejected: invalid".to_string())
                })?;
                promo.evaluate(subtotal, now).map_err(|reason| {
                    AppError::Conflict(format!("Promo code rejected: {}", reason))
                })?;
                AppliedCode::Promo(promo)
            }
            (None, Some(code)) => {
                validate_referral(&mut tx, code, &request.email).await?;
                AppliedCode::Referral {
                    code: code.to_uppercase(),
                }
            }
            (None, None) => AppliedCode::None,
        };

        let credit_balance = match &applied {
            AppliedCode::Referral { .. } => 0,
            _ => customer.referral_credit_cents,
        };
        let breakdown = pricing::quote(&QuoteInput {
            rental_lines: cart
                .items
                .iter()
                .map(|(product, quantity)| RentalLine {
                    quantity: i64::from(*quantity),
                    daily_rate_cents: product.daily_rate_cents,
                })
                .collect(),
            addon_lines: cart
                .addons
                .iter()
                .map(|(addon, quantity)| AddonLine {
                    quantity: i64::from(*quantity),
                    price_cents: addon.price_cents,
                })
                .collect(),
            days,
            days_until_delivery,
            return_method: request.return_method,
            code_discount: applied.to_discount(),
            credit_balance_cents: credit_balance,
            tax_rate: city.effective_tax_rate(),
        });

        let order = Order::insert(
            &mut tx,
            &NewOrder {
                customer_id: customer.id,
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                email: request.email.clone(),
                phone: request.phone.clone(),
                city_id: city.id,
                delivery_date: request.delivery_date,
                return_date: request.return_date,
                delivery_window: request.delivery_window.clone(),
                return_window: request.return_window.clone(),
                delivery_address: request.delivery_address.clone(),
                return_address: request.return_address.clone(),
                return_method: request.return_method,
                pricing: breakdown.clone(),
                promo_code_id: match &applied {
                    AppliedCode::Promo(promo) => Some(promo.id),
                    _ => None,
                },
                referral_code_used: match &applied {
                    AppliedCode::Referral { code } => Some(code.clone()),
                    _ => None,
                },
            },
        )
        .await?;

        for (product, quantity) in &cart.items {
            OrderItem::insert(
                &mut tx,
                order.id,
                product.id,
                &product.slug,
                &product.name,
                *quantity,
                product.daily_rate_cents,
                days as i32,
            )
            .await?;
        }
        for (addon, quantity) in &cart.addons {
            OrderAddon::insert(
                &mut tx,
                order.id,
                addon.id,
                &addon.slug,
                &addon.name,
                *quantity,
                addon.price_cents,
            )
            .await?;
        }

        for requirement in &requirements {
            let reserved = Reservation::allocate(
                &mut tx,
                order.id,
                city.id,
                requirement.product_id,
                request.delivery_date,
                request.return_date,
                requirement.needed,
            )
            .await
            .map_err(map_reservation_conflict)?;

            if (reserved.len() as i64) < requirement.needed {
                let available = reserved.len() as i64;
                tx.rollback().await?;
                warn!(
                    order_id = %order.id,
                    product = %requirement.slug,
                    needed = requirement.needed,
                    available,
                    "Checkout rejected: pool ran short at commit time"
                );
                return Err(AppError::InsufficientInventory {
                    product: requirement.slug.clone(),
                    needed: requirement.needed,
                    available,
                });
            }
        }

        if breakdown.credit_applied_cents > 0 {
            Customer::deduct_credit(&mut tx, customer.id, breakdown.credit_applied_cents).await?;
        }
        if let AppliedCode::Promo(promo) = &applied {
            PromoCode::increment_usage(&mut tx, promo.id).await?;
        }

        tx.commit().await.map_err(|err| {
            if is_retryable_conflict(&err) {
                AppError::Conflict(
                    "Another checkout reserved these bags first; please try again".to_string(),
                )
            } else {
                AppError::Database(err)
            }
        })?;
        info!(
            order_id = %order.id,
            city = %city.slug,
            total = breakdown.total_cents,
            "Booking committed"
        );

        let intent = match self.payment_service.create_intent_for_order(&order).await {
            Ok(intent) => intent,
            Err(err) => {
                error!(
                    order_id = %order.id,
                    error = %err,
                    "Payment intent creation failed; releasing the booking"
                );
                if let Err(cancel_err) = self
                    .cancel_internal(order.id, "payment intent creation failed")
                    .await
                {
                    error!(
                        order_id = %order.id,
                        error = %cancel_err,
                        "Failed to release booking after payment setup error"
                    );
                }
                return Err(err);
            }
        };
        Order::set_payment_intent(&self.pool, order.id, &intent.id).await?;

        Ok(CheckoutResponse {
            order_id: order.id,
            payment_client_token: intent.client_token,
            pricing: breakdown,
        })
    }

    /// Apply a payment gateway outcome to the owning order. A success event
    /// is first cross-checked against the provider, then confirms a pending
    /// order and pays the referral reward; failure auto-cancels it,
    /// releasing its reservations. Duplicate deliveries of the same outcome
    /// are acknowledged without effect.
    pub async fn confirm_payment(&self, event: &PaymentWebhookEvent) -> Result<(), AppError> {
        let order = Order::find_by_payment_intent(&self.pool, &event.payment_intent_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No order for payment intent {}",
                    event.payment_intent_id
                ))
            })?;

        match event.outcome {
            PaymentOutcome::Succeeded => match order.status {
                OrderStatus::Pending => {
                    self.payment_service
                        .verify_intent_succeeded(&event.payment_intent_id)
                        .await?;
                    let confirmed = Order::confirm_if_pending(&self.pool, order.id)
                        .await?
                        .ok_or_else(|| {
                            AppError::Conflict("Order is no longer awaiting payment".to_string())
                        })?;
                    info!(order_id = %confirmed.id, "Payment captured, order confirmed");

                    if let Some(code) = &confirmed.referral_code_used {
                        self.reward_referrer(code, confirmed.id).await?;
                    }
                    if let Err(err) = self
                        .notification_service
                        .send_booking_confirmation(&confirmed)
                        .await
                    {
                        warn!(order_id = %confirmed.id, error = %err, "Confirmation notice failed");
                    }
                    Ok(())
                }
                OrderStatus::Confirmed => {
                    debug!(order_id = %order.id, "Duplicate payment webhook ignored");
                    Ok(())
                }
                status => Err(AppError::Conflict(format!(
                    "Payment succeeded for an order in state {}",
                    status
                ))),
            },
            PaymentOutcome::Failed => match order.status {
                OrderStatus::Pending => {
                    warn!(order_id = %order.id, "Payment failed, auto-cancelling order");
                    self.cancel_internal(order.id, "payment failed").await?;
                    Ok(())
                }
                OrderStatus::Cancelled => Ok(()),
                status => Err(AppError::Conflict(format!(
                    "Payment failure reported for an order in state {}",
                    status
                ))),
            },
        }
    }

    /// Customer-initiated cancellation: ownership, the 48-hour cutoff, and
    /// the state machine are checked, then the transactional core releases
    /// reservations and restores credit. A refund, if owed, is dispatched
    /// afterwards and its failure never rolls the cancellation back.
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        request: &CancelOrderRequest,
    ) -> Result<OrderResponse, AppError> {
        let order = Order::find_for_customer(&self.pool, order_id, &request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if order.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Order is already {}",
                order.status
            )));
        }
        if !cancellation_window_open(Utc::now(), order.delivery_date) {
            return Err(AppError::Conflict(format!(
                "Cancellations must be made at least {} hours before the delivery date",
                CANCELLATION_CUTOFF_HOURS
            )));
        }

        let cancelled = self
            .cancel_internal(order_id, "customer request")
            .await?
            .ok_or_else(|| AppError::Conflict("Order is already cancelled".to_string()))?;

        if let Some(intent_id) = &cancelled.payment_intent_id {
            if order.status == OrderStatus::Pending {
                // Nothing captured yet; void the intent so the hold drops.
                if let Err(err) = self.payment_service.cancel_intent(intent_id).await {
                    warn!(order_id = %order_id, error = %err, "Could not void payment intent");
                }
            } else if let Err(err) = self.payment_service.refund_order(&cancelled).await {
                error!(order_id = %order_id, error = %err, "Refund failed after cancellation");
                let note = format!("Refund failed: {}; manual reconciliation required", err);
                if let Err(note_err) = Order::append_admin_note(&self.pool, order_id, &note).await
                {
                    error!(order_id = %order_id, error = %note_err, "Could not record refund failure");
                }
                if let Err(alert_err) = self
                    .notification_service
                    .send_refund_failure_alert(&cancelled, &err.to_string())
                    .await
                {
                    warn!(order_id = %order_id, error = %alert_err, "Refund failure alert not sent");
                }
            }
        }
        if let Err(err) = self
            .notification_service
            .send_cancellation_notice(&cancelled)
            .await
        {
            warn!(order_id = %order_id, error = %err, "Cancellation notice failed");
        }

        self.order_response(cancelled, false).await
    }

    /// Replace the delivery or return address on an order, subject to the
    /// 24-hour cutoff before the relevant date. Ship-back orders carry a
    /// prepaid label, so their return address is immutable.
    pub async fn update_address(
        &self,
        order_id: Uuid,
        request: &UpdateAddressRequest,
    ) -> Result<OrderResponse, AppError> {
        let order = Order::find_for_customer(&self.pool, order_id, &request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if order.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Order is already {}",
                order.status
            )));
        }

        let now = Utc::now();
        match request.field {
            AddressField::Delivery => {
                if !address_window_open(now, order.delivery_date) {
                    return Err(AppError::Conflict(format!(
                        "Delivery address changes must be made at least {} hours before the delivery date",
                        ADDRESS_CHANGE_CUTOFF_HOURS
                    )));
                }
            }
            AddressField::Return => {
                if order.return_method == ReturnMethod::Ship {
                    return Err(AppError::Conflict(
                        "Ship-back orders use a prepaid label; the return address cannot be changed"
                            .to_string(),
                    ));
                }
                if !address_window_open(now, order.return_date) {
                    return Err(AppError::Conflict(format!(
                        "Return address changes must be made at least {} hours before the return date",
                        ADDRESS_CHANGE_CUTOFF_HOURS
                    )));
                }
            }
        }

        let updated = Order::update_address(&self.pool, order_id, request.field, &request.new_address)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        info!(order_id = %order_id, field = %request.field, "Order address updated");
        self.order_response(updated, false).await
    }

    /// Staff-driven fulfillment transition. Beyond "not already terminal"
    /// and the ship-back pickup exclusion, the progression is trusted.
    pub async fn update_fulfillment(
        &self,
        order_id: Uuid,
        request: &UpdateFulfillmentRequest,
    ) -> Result<OrderResponse, AppError> {
        let order = Order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        validate_fulfillment_target(order.status, request.status, order.return_method)?;

        let updated = Order::update_status(&self.pool, order_id, request.status)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Order reached a terminal state first".to_string())
            })?;
        info!(order_id = %order_id, from = %order.status, to = %updated.status, "Fulfillment status updated");
        self.order_response(updated, true).await
    }

    /// Customer order lookup, gated on the requester's email.
    pub async fn get_order(&self, order_id: Uuid, email: &str) -> Result<OrderResponse, AppError> {
        let order = Order::find_for_customer(&self.pool, order_id, email)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.order_response(order, false).await
    }

    /// Admin order detail, including payment reference and audit notes.
    pub async fn get_order_admin(&self, order_id: Uuid) -> Result<OrderResponse, AppError> {
        let order = Order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.order_response(order, true).await
    }

    /// Admin order listing, newest first.
    pub async fn list_orders(
        &self,
        query: &AdminOrdersQuery,
    ) -> Result<Vec<OrderSummaryResponse>, AppError> {
        let pagination = Pagination::page(query.page, query.per_page);
        let rows = Order::list_summaries(&self.pool, query.status, &pagination).await?;
        Ok(rows
            .into_iter()
            .map(|row| OrderSummaryResponse {
                id: row.id,
                status: row.status,
                email: row.email,
                city_slug: row.city_slug,
                delivery_date: row.delivery_date,
                return_date: row.return_date,
                total_cents: row.total_cents,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Append a timestamped line to an order's audit log.
    pub async fn append_note(&self, order_id: Uuid, note: &str) -> Result<OrderResponse, AppError> {
        let updated = Order::append_admin_note(&self.pool, order_id, note)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.order_response(updated, true).await
    }

    /// Cancel pending orders that never saw a payment outcome. Runs from
    /// the background sweep; each failure is logged and the sweep moves on.
    pub async fn sweep_abandoned(&self, max_age_hours: i64) -> Result<u64, AppError> {
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours);
        let stale = Order::find_pending_older_than(&self.pool, cutoff).await?;
        let mut swept = 0u64;
        for order in stale {
            match self.cancel_internal(order.id, "abandoned checkout sweep").await {
                Ok(Some(cancelled)) => {
                    swept += 1;
                    if let Some(intent_id) = &cancelled.payment_intent_id {
                        if let Err(err) = self.payment_service.cancel_intent(intent_id).await {
                            warn!(order_id = %order.id, error = %err, "Could not void abandoned intent");
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    error!(order_id = %order.id, error = %err, "Failed to sweep abandoned order");
                }
            }
        }
        if swept > 0 {
            info!(swept, "Abandoned pending orders cancelled");
        }
        Ok(swept)
    }

    /// Spawn the periodic abandonment sweep.
    pub fn start_background_tasks(&self, config: &AppConfig) {
        let service = self.clone();
        let interval_secs = config.abandoned_sweep_interval_secs;
        let max_age_hours = config.abandoned_sweep_hours;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                if let Err(err) = service.sweep_abandoned(max_age_hours).await {
                    error!(error = %err, "Abandonment sweep failed");
                }
            }
        });
    }

    /// The transactional core of every cancellation path: flip the status,
    /// release reservations, restore applied credit. Returns None when the
    /// order was already terminal (or missing), which callers treat as
    /// "nothing to do".
    async fn cancel_internal(
        &self,
        order_id: Uuid,
        reason: &str,
    ) -> Result<Option<Order>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = Order::cancel_if_active(&mut tx, order_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let released = Reservation::delete_for_order(&mut tx, order_id).await?;
        if order.credit_applied_cents > 0 {
            let restored =
                Customer::add_credit_by_email(&mut *tx, &order.email, order.credit_applied_cents)
                    .await?;
            if !restored {
                warn!(order_id = %order_id, "No customer record found to restore credit to");
            }
        }
        tx.commit().await?;
        info!(order_id = %order_id, released, reason, "Order cancelled");
        Ok(Some(order))
    }

    async fn reward_referrer(&self, code: &str, order_id: Uuid) -> Result<(), AppError> {
        match Customer::find_by_referral_code(&self.pool, code).await? {
            Some(owner) => {
                Customer::add_credit_by_email(&self.pool, &owner.email, REFERRAL_REWARD_CENTS)
                    .await?;
                info!(
                    order_id = %order_id,
                    referrer = %owner.email,
                    amount = REFERRAL_REWARD_CENTS,
                    "Referral reward credited"
                );
            }
            None => {
                warn!(order_id = %order_id, code, "Referral code owner not found; no reward issued");
            }
        }
        Ok(())
    }

    async fn load_set_components(&self) -> Result<(Product, Product), AppError> {
        let carryon = Product::find_by_slug(&self.pool, CARRYON_SLUG)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Catalog is missing the {CARRYON_SLUG} set component"))
            })?;
        let large = Product::find_by_slug(&self.pool, LARGE_SLUG)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Catalog is missing the {LARGE_SLUG} set component"))
            })?;
        Ok((carryon, large))
    }

    async fn order_response(
        &self,
        order: Order,
        include_internal: bool,
    ) -> Result<OrderResponse, AppError> {
        let city = City::find_by_id(&self.pool, order.city_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Order {} references an unknown city", order.id))
            })?;
        let items = OrderItem::for_order(&self.pool, order.id).await?;
        let addons = OrderAddon::for_order(&self.pool, order.id).await?;

        Ok(OrderResponse {
            id: order.id,
            status: order.status,
            first_name: order.first_name.clone(),
            last_name: order.last_name.clone(),
            email: order.email.clone(),
            phone: order.phone.clone(),
            city_slug: city.slug,
            delivery_date: order.delivery_date,
            return_date: order.return_date,
            delivery_window: order.delivery_window.clone(),
            return_window: order.return_window.clone(),
            delivery_address: order.delivery_address.clone(),
            return_address: order.return_address.clone(),
            return_method: order.return_method,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_slug: item.product_slug,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    daily_rate_cents: item.daily_rate_cents,
                    days: item.days,
                    line_total_cents: item.line_total_cents,
                })
                .collect(),
            addons: addons
                .into_iter()
                .map(|addon| OrderAddonResponse {
                    addon_slug: addon.addon_slug,
                    addon_name: addon.addon_name,
                    quantity: addon.quantity,
                    price_cents: addon.price_cents,
                    line_total_cents: addon.line_total_cents,
                })
                .collect(),
            pricing: order.breakdown(),
            payment_intent_id: if include_internal {
                order.payment_intent_id.clone()
            } else {
                None
            },
            admin_notes: include_internal.then(|| order.admin_notes.clone()),
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

/// Expand cart lines into physical pool requirements: a set consumes one
/// carry-on and one large per unit, and overlapping lines merge. The result
/// is ordered by slug so allocation always touches pools in the same order.
pub(crate) fn expand_cart(
    items: &[(Product, i32)],
    set_components: Option<&(Product, Product)>,
) -> Result<Vec<PoolRequirement>, AppError> {
    fn push(list: &mut Vec<PoolRequirement>, product: &Product, quantity: i64) {
        if let Some(existing) = list.iter_mut().find(|r| r.product_id == product.id) {
            existing.needed += quantity;
        } else {
            list.push(PoolRequirement {
                product_id: product.id,
                slug: product.slug.clone(),
                needed: quantity,
            });
        }
    }

    let mut requirements = Vec::new();
    for (product, quantity) in items {
        let quantity = i64::from(*quantity);
        if product.is_set() {
            let (carryon, large) = set_components.ok_or_else(|| {
                AppError::Internal("Set components not loaded for cart expansion".to_string())
            })?;
            push(&mut requirements, carryon, quantity);
            push(&mut requirements, large, quantity);
        } else {
            push(&mut requirements, product, quantity);
        }
    }
    requirements.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(requirements)
}

/// Cancellation is allowed until 48 hours before the delivery date.
pub(crate) fn cancellation_window_open(now: DateTime<Utc>, delivery_date: chrono::NaiveDate) -> bool {
    hours_until(now, delivery_date) >= CANCELLATION_CUTOFF_HOURS
}

/// Address changes are allowed until 24 hours before the relevant date.
pub(crate) fn address_window_open(now: DateTime<Utc>, date: chrono::NaiveDate) -> bool {
    hours_until(now, date) >= ADDRESS_CHANGE_CUTOFF_HOURS
}

pub(crate) fn validate_fulfillment_target(
    current: OrderStatus,
    target: OrderStatus,
    return_method: ReturnMethod,
) -> Result<(), AppError> {
    if current.is_terminal() {
        return Err(AppError::Conflict(format!("Order is already {}", current)));
    }
    match target {
        OrderStatus::Pending => Err(AppError::Validation(
            "Orders cannot move back to pending".to_string(),
        )),
        OrderStatus::Cancelled => Err(AppError::Validation(
            "Use the cancellation endpoint to cancel an order".to_string(),
        )),
        OrderStatus::OutForPickup if return_method == ReturnMethod::Ship => {
            Err(AppError::Validation(
                "Ship-back orders have no pickup leg".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

fn map_reservation_conflict(err: AppError) -> AppError {
    match err {
        AppError::Database(db) if is_retryable_conflict(&db) => AppError::Conflict(
            "Another checkout reserved these bags first; please try again".to_string(),
        ),
        other => other,
    }
}
