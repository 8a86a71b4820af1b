use axum::http::{HeaderName, HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use slotbook_api::middleware::auth::WEBHOOK_SECRET_HEADER;
use slotbook_core::models::{
    booking::BookingStatus,
    payment::{PaymentEventOutcome, PaymentEventResponse, PaymentResponse, PaymentStatus},
};
use uuid::Uuid;

use crate::test_utils::{as_actor, assert_error, TestApp, WEBHOOK_SECRET};

async fn booking_with_reference(app: &TestApp, reference: &str) -> Uuid {
    let slot = app.upcoming_slot(24).await;
    let booking_id = app.book(&slot).await;

    let response = as_actor(app.server.post("/api/payments/reference"), &app.customer())
        .json(&json!({
            "booking_id": booking_id,
            "reference": reference,
            "payment_method": "card",
        }))
        .await;
    response.assert_status_ok();
    let payment = response.json::<PaymentResponse>().payment;
    assert_eq!(payment.payment_reference.as_deref(), Some(reference));
    assert_eq!(payment.payment_method.as_deref(), Some("card"));

    booking_id.parse().unwrap()
}

#[tokio::test]
async fn test_webhook_applies_payment_once() {
    let app = TestApp::new().await;
    let booking_id = booking_with_reference(&app, "pi_123").await;
    let event = json!({ "reference": "pi_123" });

    let response = app.payment_webhook(&event).await;
    response.assert_status_ok();
    let body = response.json::<PaymentEventResponse>();
    assert!(body.received);
    assert_eq!(body.outcome, PaymentEventOutcome::Applied);

    let payment = app.store.payment(booking_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.paid_at.is_some());
    assert_eq!(
        app.store.booking(booking_id).await.unwrap().status,
        BookingStatus::Confirmed
    );

    let response = app.payment_webhook(&event).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<PaymentEventResponse>().outcome,
        PaymentEventOutcome::AlreadyApplied
    );
    assert_eq!(app.store.payment(booking_id).await.unwrap(), payment);
}

#[tokio::test]
async fn test_webhook_unknown_reference() {
    let app = TestApp::new().await;

    let response = app
        .payment_webhook(&json!({ "reference": "pi_missing" }))
        .await;

    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_webhook_secret() {
    let app = TestApp::new().await;
    booking_with_reference(&app, "pi_456").await;
    let event = json!({ "reference": "pi_456" });

    let response = app.server.post("/api/payments/webhook").json(&event).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "authentication");

    let response = app
        .server
        .post("/api/payments/webhook")
        .add_header(
            HeaderName::from_static(WEBHOOK_SECRET_HEADER),
            HeaderValue::from_static("wrong"),
        )
        .json(&event)
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "authentication");

    let response = app
        .server
        .post("/api/payments/webhook")
        .add_header(
            HeaderName::from_static(WEBHOOK_SECRET_HEADER),
            HeaderValue::from_static(WEBHOOK_SECRET),
        )
        .json(&event)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["outcome"], "applied");
}

#[tokio::test]
async fn test_webhook_rejected_without_configured_secret() {
    let app = TestApp::with_webhook_secret(None).await;
    let booking_id = booking_with_reference(&app, "pi_open").await;

    let response = app
        .server
        .post("/api/payments/webhook")
        .json(&json!({ "reference": "pi_open" }))
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "authentication");

    let response = app
        .payment_webhook(&json!({ "reference": "pi_open" }))
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "authentication");

    assert_eq!(
        app.store.payment(booking_id).await.unwrap().status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_webhook_keeps_booking_price() {
    let app = TestApp::new().await;
    let booking_id = booking_with_reference(&app, "pi_cheap").await;

    let response = app
        .payment_webhook(&json!({ "reference": "pi_cheap", "amount": "1" }))
        .await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");

    let payment = app.store.payment(booking_id).await.unwrap();
    assert_eq!(payment.amount, Decimal::new(50000, 0));
    assert_eq!(payment.status, PaymentStatus::Pending);

    let response = app
        .payment_webhook(&json!({ "reference": "pi_cheap", "amount": "50000", "currency": "USD" }))
        .await;
    response.assert_status_ok();
    let payment = app.store.payment(booking_id).await.unwrap();
    assert_eq!(payment.amount, Decimal::new(50000, 0));
    assert_eq!(payment.currency, "usd");
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_attach_reference_rules() {
    let app = TestApp::new().await;
    let booking_id = booking_with_reference(&app, "pi_789").await;

    let other_slot = app.upcoming_slot(48).await;
    let other_booking = app.book(&other_slot).await;

    let response = as_actor(app.server.post("/api/payments/reference"), &app.customer())
        .json(&json!({ "booking_id": other_booking, "reference": "pi_789" }))
        .await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");

    let response = as_actor(app.server.post("/api/payments/reference"), &app.customer())
        .json(&json!({ "booking_id": other_booking, "reference": "  " }))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "validation");

    let response = as_actor(app.server.post("/api/payments/reference"), &app.owner())
        .json(&json!({ "booking_id": booking_id, "reference": "pi_other" }))
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}
