use actix_web::{post, web, HttpResponse, Result};
use tracing::info;

use crate::error::AppError;
use crate::services::BookingService;
use ooloo_shared::dto::{PaymentWebhookEvent, WebhookAck};

/// Payment gateway callback: capture succeeded or failed for an intent.
/// Success confirms the pending order; failure auto-cancels it and frees
/// its reservations.
#[post("/payments")]
pub async fn payment_webhook(
    event: web::Json<PaymentWebhookEvent>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    info!(
        "Payment webhook for intent {}: {:?}",
        event.payment_intent_id, event.outcome
    );

    booking_service.confirm_payment(&event).await?;

    Ok(HttpResponse::Ok().json(WebhookAck { received: true }))
}
