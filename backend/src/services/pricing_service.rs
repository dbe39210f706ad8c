use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppError;
use crate::models::{Addon, City, Customer, Product, PromoCode};
use ooloo_shared::dates::{days_until, rental_days};
use ooloo_shared::dto::{
    CartAddon, CartItem, CreatePromoCodeRequest, PromoCodeResponse, PromoValidateRequest,
    PromoValidateResponse, QuoteRequest, QuoteResponse,
};
use ooloo_shared::pricing::{self, AddonLine, CodeDiscount, QuoteInput, RentalLine};
use ooloo_shared::types::Cents;

/// A cart with its slugs resolved against the live catalog and quantities
/// checked. Prices always come from the catalog rows, never the client.
#[derive(Debug, Clone)]
pub struct ResolvedCart {
    pub items: Vec<(Product, i32)>,
    pub addons: Vec<(Addon, i32)>,
}

/// Which discount code survived validation, if any. Promo and referral
/// codes are mutually exclusive.
#[derive(Debug, Clone)]
pub enum AppliedCode {
    None,
    Promo(PromoCode),
    Referral { code: String },
}

impl AppliedCode {
    pub fn to_discount(&self) -> Option<CodeDiscount> {
        match self {
            AppliedCode::None => None,
            AppliedCode::Promo(promo) => Some(CodeDiscount::Promo {
                discount_type: promo.discount_type,
                value: promo.discount_value,
            }),
            AppliedCode::Referral { .. } => Some(CodeDiscount::Referral),
        }
    }
}

/// Server-side pricing front end. The arithmetic itself is pure and lives
/// in the shared crate; this service resolves catalog rows, code state,
/// and credit balances, then hands the numbers over.
#[derive(Clone)]
pub struct PricingService {
    pool: PgPool,
}

impl PricingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Price a prospective booking without touching any state.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, AppError> {
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

        let city = City::find_by_slug(&self.pool, &request.city_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown city: {}", request.city_slug)))?;
        let cart = self.resolve_cart(&request.items, &request.addons).await?;
        let days = rental_days(request.delivery_date, request.return_date);

        let applied = self
            .resolve_code(
                request.promo_code.as_deref(),
                request.referral_code.as_deref(),
                request.customer_email.as_deref(),
                rental_subtotal(&cart, days),
            )
            .await?;
        let credit_balance = match (&applied, request.customer_email.as_deref()) {
            // Referral discounts only apply to brand-new customers, who by
            // definition carry no credit.
            (AppliedCode::Referral { .. }, _) | (_, None) => 0,
            (_, Some(email)) => Customer::find_by_email(&self.pool, email)
                .await?
                .map(|c| c.referral_credit_cents)
                .unwrap_or(0),
        };

        let input = QuoteInput {
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
        };
        let breakdown = pricing::quote(&input);
        debug!(
            city = %city.slug,
            days,
            total = breakdown.total_cents,
            "Quote computed"
        );

        Ok(QuoteResponse {
            days,
            pricing: breakdown,
        })
    }

    /// Create a promo code (admin surface).
    pub async fn create_promo(
        &self,
        request: &CreatePromoCodeRequest,
    ) -> Result<PromoCodeResponse, AppError> {
        let promo = PromoCode::create(&self.pool, request).await?;
        Ok(PromoCodeResponse {
            id: promo.id,
            code: promo.code,
            discount_type: promo.discount_type,
            discount_value: promo.discount_value,
            min_order_total_cents: promo.min_order_total_cents,
            usage_limit: promo.usage_limit,
            times_used: promo.times_used,
            expires_at: promo.expires_at,
            active: promo.active,
            created_at: promo.created_at,
        })
    }

    /// Structured accept/reject for a promo code against a rental subtotal.
    /// Rejections come back as data, not errors, so the booking UI can show
    /// the reason inline.
    pub async fn validate_promo(
        &self,
        request: &PromoValidateRequest,
    ) -> Result<PromoValidateResponse, AppError> {
        let Some(promo) = PromoCode::find_by_code(&self.pool, &request.code).await? else {
            return Ok(PromoValidateResponse {
                accepted: false,
                discount_type: None,
                discount_value: None,
                rejection_reason: Some(ooloo_shared::types::PromoRejection::Invalid),
            });
        };

        match promo.evaluate(request.rental_subtotal_cents, Utc::now()) {
            Ok(()) => Ok(PromoValidateResponse {
                accepted: true,
                discount_type: Some(promo.discount_type),
                discount_value: Some(promo.discount_value),
                rejection_reason: None,
            }),
            Err(reason) => Ok(PromoValidateResponse {
                accepted: false,
                discount_type: None,
                discount_value: None,
                rejection_reason: Some(reason),
            }),
        }
    }

    /// Resolve cart slugs to catalog rows, rejecting unknown slugs and
    /// non-positive quantities.
    pub async fn resolve_cart(
        &self,
        items: &[CartItem],
        addons: &[CartAddon],
    ) -> Result<ResolvedCart, AppError> {
        let mut resolved_items = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity < 1 {
                return Err(AppError::Validation(format!(
                    "Quantity for {} must be at least 1",
                    item.product_slug
                )));
            }
            let product = Product::find_by_slug(&self.pool, &item.product_slug)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Unknown product: {}", item.product_slug))
                })?;
            resolved_items.push((product, item.quantity));
        }

        let mut resolved_addons = Vec::with_capacity(addons.len());
        for addon in addons {
            if addon.quantity < 1 {
                return Err(AppError::Validation(format!(
                    "Quantity for {} must be at least 1",
                    addon.addon_slug
                )));
            }
            let record = Addon::find_by_slug(&self.pool, &addon.addon_slug)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Unknown addon: {}", addon.addon_slug))
                })?;
            resolved_addons.push((record, addon.quantity));
        }

        Ok(ResolvedCart {
            items: resolved_items,
            addons: resolved_addons,
        })
    }

    /// Resolve and validate whichever discount code was supplied. Promo
    /// rejections surface as conflicts with the rejection reason; referral
    /// codes additionally require a first-time customer who is not
    /// referring themselves.
    pub async fn resolve_code(
        &self,
        promo_code: Option<&str>,
        referral_code: Option<&str>,
        customer_email: Option<&str>,
        rental_subtotal_cents: Cents,
    ) -> Result<AppliedCode, AppError> {
        match (promo_code, referral_code) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "A promo code and a referral code cannot be combined".to_string(),
            )),
            (Some(code), None) => {
                let promo = PromoCode::find_by_code(&self.pool, code)
                    .await?
                    .ok_or_else(|| {
                        AppError::Conflict("Promo code rejected: invalid".to_string())
                    })?;
                promo
                    .evaluate(rental_subtotal_cents, Utc::now())
                    .map_err(|reason| {
                        AppError::Conflict(format!("Promo code rejected: {}", reason))
                    })?;
                Ok(AppliedCode::Promo(promo))
            }
            (None, Some(code)) => {
                let email = customer_email.ok_or_else(|| {
                    AppError::Validation(
                        "customer email is required to apply a referral code".to_string(),
                    )
                })?;
                let mut conn = self.pool.acquire().await?;
                validate_referral(&mut conn, code, email).await?;
                Ok(AppliedCode::Referral {
                    code: code.to_uppercase(),
                })
            }
            (None, None) => Ok(AppliedCode::None),
        }
    }
}

/// The three referral eligibility checks: the code exists, it belongs to
/// someone else, and the applying customer is genuinely new (no orders on
/// file and no accumulated credit). Takes a connection so checkout can run
/// the same checks inside its transaction.
pub async fn validate_referral(
    conn: &mut sqlx::PgConnection,
    code: &str,
    customer_email: &str,
) -> Result<(), AppError> {
    let owner = Customer::find_by_referral_code(&mut *conn, code)
        .await?
        .ok_or_else(|| AppError::NotFound("Referral code not found".to_string()))?;
    if owner.email.eq_ignore_ascii_case(customer_email) {
        return Err(AppError::Conflict(
            "You cannot use your own referral code".to_string(),
        ));
    }
    if Customer::has_prior_orders(&mut *conn, customer_email).await? {
        return Err(AppError::Conflict(
            "Referral discounts are for first-time customers".to_string(),
        ));
    }
    let existing = Customer::find_by_email(&mut *conn, customer_email).await?;
    if existing.map(|c| c.referral_credit_cents).unwrap_or(0) > 0 {
        return Err(AppError::Conflict(
            "Customers with referral credit apply it instead of a referral code".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn rental_subtotal(cart: &ResolvedCart, days: i64) -> Cents {
    cart.items
        .iter()
        .map(|(product, quantity)| i64::from(*quantity) * product.daily_rate_cents * days)
        .sum()
}
