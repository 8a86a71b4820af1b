use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use slotbook_core::{
    models::{
        actor::{Actor, Role},
        booking::{BookingListResponse, BookingStatus, BookingUpdateResponse, CreateBookingResponse},
        payment::PaymentStatus,
    },
    notify::Notification,
};
use fake::{faker::name::en::Name, Fake};
use slotbook_db::mock::MockNotifier;
use std::{sync::Arc, time::Duration};
use test_log::test;
use uuid::Uuid;

use crate::test_utils::{as_actor, assert_error, TestApp};

#[test(tokio::test)]
async fn test_create_booking() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;

    let response = as_actor(app.server.post("/api/bookings"), &app.customer())
        .json(&app.booking_body(&slot))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<CreateBookingResponse>();
    assert_eq!(body.message, "Booking created successfully");
    assert_eq!(body.booking.status, BookingStatus::Booked);
    assert_eq!(body.booking.timeslot_id, slot.id);
    assert_eq!(body.booking.customer_notes.as_deref(), Some("First visit"));
    assert_eq!(body.booking.service_name, "Haircut");
    assert_eq!(body.payment.status, PaymentStatus::Pending);
    assert_eq!(body.payment.amount, app.service.price);
    assert_eq!(body.payment.currency, "usd");

    assert!(app.store.slot(slot.id).await.unwrap().is_booked);

    let delivered = app.notifier.wait_for(1, Duration::from_secs(1)).await;
    assert!(matches!(
        delivered.as_slice(),
        [Notification::BookingConfirmed(details)] if details.id == body.booking.id
    ));
}

#[test(tokio::test)]
async fn test_create_booking_requires_identity_headers() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;

    let response = app
        .server
        .post("/api/bookings")
        .json(&app.booking_body(&slot))
        .await;

    assert_error(&response, StatusCode::UNAUTHORIZED, "authentication");
    assert!(!app.store.slot(slot.id).await.unwrap().is_booked);
}

#[test(tokio::test)]
async fn test_create_booking_rejects_unknown_role() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;

    let response = app
        .server
        .post("/api/bookings")
        .add_header(
            axum::http::HeaderName::from_static("x-user-id"),
            axum::http::HeaderValue::from_str(&app.customer.id.to_string()).unwrap(),
        )
        .add_header(
            axum::http::HeaderName::from_static("x-user-role"),
            axum::http::HeaderValue::from_static("superuser"),
        )
        .json(&app.booking_body(&slot))
        .await;

    assert_error(&response, StatusCode::UNAUTHORIZED, "authentication");
}

#[test(tokio::test)]
async fn test_booking_a_taken_slot_is_a_conflict() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    app.book(&slot).await;

    let other = app.store.add_user("Sam Other", Role::Customer).await;
    let response = as_actor(app.server.post("/api/bookings"), &Actor::customer(other.id))
        .json(&app.booking_body(&slot))
        .await;

    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[test(tokio::test)]
async fn test_create_booking_with_malformed_body() {
    let app = TestApp::new().await;

    let response = as_actor(app.server.post("/api/bookings"), &app.customer())
        .json(&json!({ "business_id": "not-a-uuid" }))
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "validation");
}

#[test(tokio::test)]
async fn test_get_booking_visibility() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    let booking_id = app.book(&slot).await;
    let path = format!("/api/bookings/{booking_id}");

    let response = as_actor(app.server.get(&path), &app.customer()).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["booking"]["id"], booking_id.as_str());

    let response = as_actor(app.server.get(&path), &app.owner()).await;
    response.assert_status_ok();

    let response = as_actor(app.server.get(&path), &Actor::admin(Uuid::new_v4())).await;
    response.assert_status_ok();

    let stranger = Actor::customer(Uuid::new_v4());
    let response = as_actor(app.server.get(&path), &stranger).await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[test(tokio::test)]
async fn test_get_booking_with_invalid_id() {
    let app = TestApp::new().await;

    let response = as_actor(app.server.get("/api/bookings/12345"), &app.customer()).await;

    assert_error(&response, StatusCode::BAD_REQUEST, "validation");
}

#[test(tokio::test)]
async fn test_cancel_booking() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    let booking_id = app.book(&slot).await;
    let path = format!("/api/bookings/{booking_id}/cancel");

    let response = as_actor(app.server.put(&path), &app.customer()).await;

    response.assert_status_ok();
    let body = response.json::<BookingUpdateResponse>();
    assert_eq!(body.message, "Booking cancelled successfully");
    assert_eq!(body.booking.status, BookingStatus::Cancelled);
    assert!(!app.store.slot(slot.id).await.unwrap().is_booked);
    assert_eq!(
        app.store.payment(body.booking.id).await.unwrap().status,
        PaymentStatus::Refunded
    );

    let response = as_actor(app.server.put(&path), &app.customer()).await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[test(tokio::test)]
async fn test_cancel_booking_by_stranger_is_denied() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    let booking_id = app.book(&slot).await;

    let stranger = Actor::customer(Uuid::new_v4());
    let response = as_actor(
        app.server.put(&format!("/api/bookings/{booking_id}/cancel")),
        &stranger,
    )
    .await;

    assert_error(&response, StatusCode::FORBIDDEN, "access_denied");
    assert!(app.store.slot(slot.id).await.unwrap().is_booked);
}

#[test(tokio::test)]
async fn test_complete_booking() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    let booking_id = app.book(&slot).await;
    let path = format!("/api/bookings/{booking_id}/complete");

    let response = as_actor(app.server.put(&path), &app.customer()).await;
    assert_error(&response, StatusCode::FORBIDDEN, "access_denied");

    let response = as_actor(app.server.put(&path), &app.owner()).await;
    response.assert_status_ok();
    let body = response.json::<BookingUpdateResponse>();
    assert_eq!(body.message, "Booking marked as completed");
    assert_eq!(body.booking.status, BookingStatus::Completed);
    assert!(app.store.slot(slot.id).await.unwrap().is_booked);

    let response = as_actor(app.server.put(&path), &app.owner()).await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[test(tokio::test)]
async fn test_list_my_bookings_with_status_filter() {
    let app = TestApp::new().await;
    let first = app.upcoming_slot(24).await;
    let second = app.upcoming_slot(48).await;
    let cancelled_id = app.book(&first).await;
    app.book(&second).await;
    as_actor(
        app.server.put(&format!("/api/bookings/{cancelled_id}/cancel")),
        &app.customer(),
    )
    .await
    .assert_status_ok();

    let response = as_actor(app.server.get("/api/bookings/customer/my"), &app.customer()).await;
    response.assert_status_ok();
    let all = response.json::<BookingListResponse>().bookings;
    assert_eq!(all.len(), 2);
    // Latest start first.
    assert_eq!(all[0].timeslot_id, second.id);

    let response = as_actor(
        app.server.get("/api/bookings/customer/my?status=cancelled"),
        &app.customer(),
    )
    .await;
    response.assert_status_ok();
    let cancelled = response.json::<BookingListResponse>().bookings;
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id.to_string(), cancelled_id);
}

#[test(tokio::test)]
async fn test_list_business_bookings_requires_ownership() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    app.book(&slot).await;
    let path = format!("/api/bookings/business/{}", app.business.id);

    let response = as_actor(app.server.get(&path), &app.owner()).await;
    response.assert_status_ok();
    assert_eq!(response.json::<BookingListResponse>().bookings.len(), 1);

    let rival = app.store.add_user("Rita Rival", Role::Business).await;
    let response = as_actor(app.server.get(&path), &Actor::business(rival.id)).await;
    assert_error(&response, StatusCode::FORBIDDEN, "access_denied");

    let response = as_actor(app.server.get(&path), &app.customer()).await;
    assert_error(&response, StatusCode::FORBIDDEN, "access_denied");
}

#[test(tokio::test)]
async fn test_failing_notifier_does_not_fail_the_request() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_booking_confirmed()
        .returning(|_| Err(eyre::eyre!("relay unreachable")));
    let app = TestApp::with_notifier(Arc::new(notifier)).await;
    let slot = app.upcoming_slot(24).await;

    let response = as_actor(app.server.post("/api/bookings"), &app.customer())
        .json(&app.booking_body(&slot))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert!(app.store.slot(slot.id).await.unwrap().is_booked);
}

#[test(tokio::test)]
async fn test_each_customer_sees_only_their_bookings() {
    let app = TestApp::new().await;
    let mut customers = Vec::new();
    for hours in 1..=3 {
        let name: String = Name().fake();
        let customer = app.store.add_user(&name, Role::Customer).await;
        let slot = app.upcoming_slot(hours * 24).await;
        as_actor(app.server.post("/api/bookings"), &Actor::customer(customer.id))
            .json(&app.booking_body(&slot))
            .await
            .assert_status(StatusCode::CREATED);
        customers.push((customer, slot));
    }

    for (customer, slot) in &customers {
        let response = as_actor(
            app.server.get("/api/bookings/customer/my"),
            &Actor::customer(customer.id),
        )
        .await;
        let bookings = response.json::<BookingListResponse>().bookings;
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].timeslot_id, slot.id);
        assert_eq!(bookings[0].customer_name, customer.name);
    }
}
