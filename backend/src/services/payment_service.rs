use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Order;
use ooloo_shared::types::Cents;

/// A payment intent as the gateway reports it. The `client_token` is handed
/// to the browser to complete capture; the backend only ever sees the
/// opaque intent id afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_token: String,
    pub status: String,
    pub amount_cents: Cents,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResult {
    pub refund_id: String,
    pub amount_cents: Cents,
}

/// The slice of the payment provider this platform needs: create and look
/// up intents by opaque id, cancel an uncaptured intent, refund a captured
/// one. Kept as a trait so tests can substitute a double.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount_cents: Cents,
        currency: &str,
        order_id: Uuid,
        email: &str,
    ) -> Result<PaymentIntent, AppError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError>;

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), AppError>;

    async fn refund(&self, intent_id: &str, amount_cents: Cents) -> Result<RefundResult, AppError>;
}

/// REST client for the hosted payment provider.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn parse_intent(&self, response: reqwest::Response) -> Result<PaymentIntent, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Payment provider returned {}: {}",
                status, body
            )));
        }
        let intent = response.json::<PaymentIntent>().await?;
        Ok(intent)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(
        &self,
        amount_cents: Cents,
        currency: &str,
        order_id: Uuid,
        email: &str,
    ) -> Result<PaymentIntent, AppError> {
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "amount": amount_cents,
                "currency": currency,
                "metadata": { "order_id": order_id, "email": email },
            }))
            .send()
            .await?;

        self.parse_intent(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError> {
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{}", self.base_url, intent_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        self.parse_intent(response).await
    }

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!(
                "{}/v1/payment_intents/{}/cancel",
                self.base_url, intent_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Upstream(format!(
                "Payment provider refused to cancel intent: {}",
                status
            )));
        }
        Ok(())
    }

    async fn refund(&self, intent_id: &str, amount_cents: Cents) -> Result<RefundResult, AppError> {
        let response = self
            .http
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "payment_intent": intent_id,
                "amount": amount_cents,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Refund failed with {}: {}",
                status, body
            )));
        }
        let refund = response.json::<RefundResult>().await?;
        Ok(refund)
    }
}

/// Payment service wraps the gateway behind a cloneable handle.
#[derive(Clone)]
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Create the intent the customer will pay against.
    pub async fn create_intent_for_order(&self, order: &Order) -> Result<PaymentIntent, AppError> {
        debug!(order_id = %order.id, amount = order.total_cents, "Creating payment intent");
        let intent = self
            .gateway
            .create_intent(order.total_cents, "usd", order.id, &order.email)
            .await?;
        info!(order_id = %order.id, intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    /// Cross-check a success webhook against the provider before acting on
    /// it. A confirmation gates physical fulfillment, so the order of record
    /// is the intent the provider holds, not the event body.
    pub async fn verify_intent_succeeded(&self, intent_id: &str) -> Result<(), AppError> {
        let intent = self.gateway.retrieve_intent(intent_id).await?;
        if intent.status != "succeeded" {
            return Err(AppError::Conflict(format!(
                "Payment provider reports intent {} as {}, not succeeded",
                intent_id, intent.status
            )));
        }
        Ok(())
    }

    /// Void an intent that will never be captured, e.g. after checkout
    /// failed downstream of intent creation.
    pub async fn cancel_intent(&self, intent_id: &str) -> Result<(), AppError> {
        self.gateway.cancel_intent(intent_id).await
    }

    /// Refund the full order total back to the customer.
    pub async fn refund_order(&self, order: &Order) -> Result<RefundResult, AppError> {
        let intent_id = order.payment_intent_id.as_deref().ok_or_else(|| {
            AppError::Internal(format!("Order {} has no payment intent to refund", order.id))
        })?;
        let refund = self.gateway.refund(intent_id, order.total_cents).await?;
        info!(
            order_id = %order.id,
            refund_id = %refund.refund_id,
            amount = refund.amount_cents,
            "Refund issued"
        );
        Ok(refund)
    }
}
