use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::models::Order;

/// Sends transactional email/SMS through the hosted messaging provider.
/// Delivery is fire-and-forget: callers log failures and move on, a
/// notification never blocks or rolls back an order operation.
#[derive(Clone)]
pub struct NotificationService {
    http: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl NotificationService {
    pub fn new(api_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    pub async fn send_booking_confirmation(&self, order: &Order) -> Result<(), AppError> {
        self.dispatch(
            "booking_confirmation",
            json!({
                "to": order.email,
                "order_id": order.id,
                "delivery_date": order.delivery_date,
                "return_date": order.return_date,
                "total_cents": order.total_cents,
            }),
        )
        .await
    }

    pub async fn send_cancellation_notice(&self, order: &Order) -> Result<(), AppError> {
        self.dispatch(
            "booking_cancelled",
            json!({
                "to": order.email,
                "order_id": order.id,
            }),
        )
        .await
    }

    /// Ops alert raised when a refund call fails after a cancellation has
    /// already committed; the refund is retried manually.
    pub async fn send_refund_failure_alert(
        &self,
        order: &Order,
        reason: &str,
    ) -> Result<(), AppError> {
        self.dispatch(
            "refund_failed",
            json!({
                "order_id": order.id,
                "payment_intent_id": order.payment_intent_id,
                "amount_cents": order.total_cents,
                "reason": reason,
            }),
        )
        .await
    }

    async fn dispatch(&self, template: &str, payload: serde_json::Value) -> Result<(), AppError> {
        let (Some(api_url), Some(api_key)) = (&self.api_url, &self.api_key) else {
            debug!(template, "Notification delivery not configured, skipping");
            return Ok(());
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", api_url))
            .bearer_auth(api_key)
            .json(&json!({ "template": template, "payload": payload }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Notification provider returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
