use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use slotbook_core::models::payment::{
    AttachPaymentReferenceRequest, PaymentEventResponse, PaymentResponse, PaymentSucceededEvent,
};
use std::sync::Arc;

use crate::{
    middleware::{
        auth::{verify_webhook_secret, CurrentActor},
        error_handling::AppError,
    },
    ApiState,
};

/// Called by the client after it created a payment intent with the provider.
#[axum::debug_handler]
pub async fn attach_reference(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<AttachPaymentReferenceRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, AppError> {
    let Json(payload) = payload?;

    let payment = state
        .coordinator
        .attach_payment_reference(&actor, payload)
        .await?;

    Ok(Json(PaymentResponse { payment }))
}

/// "Payment succeeded" callback from the payment provider. Replays are
/// acknowledged with `already_applied`.
#[axum::debug_handler]
pub async fn payment_webhook(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    payload: Result<Json<PaymentSucceededEvent>, JsonRejection>,
) -> Result<Json<PaymentEventResponse>, AppError> {
    verify_webhook_secret(&headers, state.payment_webhook_secret.as_deref())?;
    let Json(event) = payload?;

    let outcome = state.coordinator.record_payment_succeeded(event).await?;

    Ok(Json(PaymentEventResponse {
        received: true,
        outcome,
    }))
}
