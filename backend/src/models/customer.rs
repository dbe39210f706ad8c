use chrono::{DateTime, Utc};
use ooloo_shared::types::Cents;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::AppError;

/// A customer record doubles as the referral ledger: every customer owns a
/// shareable referral code and an accumulated credit balance.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub referral_code: String,
    pub referral_credit_cents: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Find a customer by email
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, email, first_name, last_name, phone, referral_code,
                    referral_credit_cents, created_at, updated_at
             FROM customers WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    /// Find the owner of a referral code
    pub async fn find_by_referral_code<'e, E>(
        executor: E,
        code: &str,
    ) -> Result<Option<Self>, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, email, first_name, last_name, phone, referral_code,
                    referral_credit_cents, created_at, updated_at
             FROM customers WHERE UPPER(referral_code) = UPPER($1)",
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    /// Insert or refresh a customer from checkout contact info, locking the
    /// row for the rest of the transaction. New customers get a fresh
    /// referral code of their own.
    pub async fn upsert_for_checkout(
        conn: &mut PgConnection,
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
    ) -> Result<Self, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (email, first_name, last_name, phone, referral_code)
             VALUES (LOWER($1), $2, $3, $4, $5)
             ON CONFLICT (email) DO UPDATE
                SET first_name = EXCLUDED.first_name,
                    last_name = EXCLUDED.last_name,
                    phone = EXCLUDED.phone,
                    updated_at = NOW()
             RETURNING id, email, first_name, last_name, phone, referral_code,
                       referral_credit_cents, created_at, updated_at",
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(generate_referral_code())
        .fetch_one(&mut *conn)
        .await?;

        // The upsert alone does not lock against concurrent credit updates.
        sqlx::query("SELECT 1 FROM customers WHERE id = $1 FOR UPDATE")
            .bind(customer.id)
            .execute(conn)
            .await?;

        Ok(customer)
    }

    /// Whether any order exists for this email, regardless of status.
    /// Referral discounts are for first-time customers only.
    pub async fn has_prior_orders<'e, E>(executor: E, email: &str) -> Result<bool, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Deduct applied credit from a customer's balance. Fails if the balance
    /// dropped below the applied amount since it was read.
    pub async fn deduct_credit(
        conn: &mut PgConnection,
        id: Uuid,
        amount: Cents,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE customers
             SET referral_credit_cents = referral_credit_cents - $2, updated_at = NOW()
             WHERE id = $1 AND referral_credit_cents >= $2",
        )
        .bind(id)
        .bind(amount)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Referral credit balance changed during checkout".to_string(),
            ));
        }
        Ok(())
    }

    /// Add credit to a customer's balance, keyed by email. Used both to
    /// restore credit on cancellation and to reward referrers.
    pub async fn add_credit_by_email<'e, E>(
        executor: E,
        email: &str,
        amount: Cents,
    ) -> Result<bool, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE customers
             SET referral_credit_cents = referral_credit_cents + $2, updated_at = NOW()
             WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .bind(amount)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn generate_referral_code() -> String {
    let code: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    code.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_are_eight_uppercase_chars() {
        for _ in 0..50 {
            let code = generate_referral_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(!code.chars().any(|c| c.is_ascii_lowercase()));
        }
    }
}
