use chrono::{DateTime, Utc};
use ooloo_shared::dto::CreatePromoCodeRequest;
use ooloo_shared::types::{Cents, DiscountType, PromoRejection};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PromoCode {
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

const PROMO_COLUMNS: &str = "id, code, discount_type, discount_value, min_order_total_cents, \
                             usage_limit, times_used, expires_at, active, created_at";

impl PromoCode {
    /// Create a new promo code
    pub async fn create(pool: &PgPool, request: &CreatePromoCodeRequest) -> Result<Self, AppError> {
        let promo = sqlx::query_as::<_, PromoCode>(&format!(
            "INSERT INTO promo_codes
                (code, discount_type, discount_value, min_order_total_cents, usage_limit, expires_at)
             VALUES (UPPER($1), $2, $3, $4, $5, $6)
             RETURNING {PROMO_COLUMNS}",
        ))
        .bind(&request.code)
        .bind(request.discount_type)
        .bind(request.discount_value)
        .bind(request.min_order_total_cents)
        .bind(request.usage_limit)
        .bind(request.expires_at)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("A promo code with that code already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(promo)
    }

    /// Find a promo code by code, case-insensitively
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, AppError> {
        let promo = sqlx::query_as::<_, PromoCode>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE UPPER(code) = UPPER($1)",
        ))
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(promo)
    }

    /// Find and lock a promo code for the duration of a checkout
    /// transaction, so the usage counter cannot race past its limit.
    pub async fn lock_by_code(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<Self>, AppError> {
        let promo = sqlx::query_as::<_, PromoCode>(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes WHERE UPPER(code) = UPPER($1) FOR UPDATE",
        ))
        .bind(code)
        .fetch_optional(conn)
        .await?;

        Ok(promo)
    }

    /// Consume one use. Called only after a checkout commits the order.
    pub async fn increment_usage(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE promo_codes SET times_used = times_used + 1 WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Check whether this code can be applied to a rental subtotal. The
    /// checks run in a fixed order and the first failure wins, so callers
    /// always report the same rejection reason for the same state.
    pub fn evaluate(
        &self,
        rental_subtotal_cents: Cents,
        now: DateTime<Utc>,
    ) -> Result<(), PromoRejection> {
        if !self.active {
            return Err(PromoRejection::Invalid);
        }
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return Err(PromoRejection::Expired);
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.times_used >= limit {
                return Err(PromoRejection::UsageLimitReached);
            }
        }
        if let Some(min_total) = self.min_order_total_cents {
            if rental_subtotal_cents < min_total {
                return Err(PromoRejection::BelowMinimum);
            }
        }
        Ok(())
    }
}
