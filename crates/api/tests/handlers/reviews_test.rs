use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use slotbook_core::models::review::CreateReviewResponse;

use crate::test_utils::{as_actor, assert_error, TestApp};

async fn completed_booking(app: &TestApp, hours_from_now: i64) -> String {
    let slot = app.upcoming_slot(hours_from_now).await;
    let booking_id = app.book(&slot).await;
    as_actor(
        app.server.put(&format!("/api/bookings/{booking_id}/complete")),
        &app.owner(),
    )
    .await
    .assert_status_ok();
    booking_id
}

#[tokio::test]
async fn test_submit_review_updates_rating() {
    let app = TestApp::new().await;
    let first = completed_booking(&app, 24).await;
    let second = completed_booking(&app, 48).await;

    let response = as_actor(app.server.post("/api/reviews"), &app.customer())
        .json(&json!({ "booking_id": first, "rating": 4, "comment": "Great cut" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body = response.json::<CreateReviewResponse>();
    assert_eq!(body.message, "Review submitted successfully");
    assert_eq!(body.review.rating, 4);
    assert_eq!(body.review.comment.as_deref(), Some("Great cut"));

    as_actor(app.server.post("/api/reviews"), &app.customer())
        .json(&json!({ "booking_id": second, "rating": 3 }))
        .await
        .assert_status(StatusCode::CREATED);

    let business = app.store.stored_business(app.business.id).await.unwrap();
    assert_eq!(business.rating, Decimal::new(350, 2));
    assert_eq!(business.total_reviews, 2);
}

#[tokio::test]
async fn test_duplicate_review_is_a_conflict() {
    let app = TestApp::new().await;
    let booking_id = completed_booking(&app, 24).await;
    let body = json!({ "booking_id": booking_id, "rating": 5 });

    as_actor(app.server.post("/api/reviews"), &app.customer())
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let response = as_actor(app.server.post("/api/reviews"), &app.customer())
        .json(&body)
        .await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[tokio::test]
async fn test_review_requires_completed_booking() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(24).await;
    let booking_id = app.book(&slot).await;

    let response = as_actor(app.server.post("/api/reviews"), &app.customer())
        .json(&json!({ "booking_id": booking_id, "rating": 5 }))
        .await;

    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let app = TestApp::new().await;
    let booking_id = completed_booking(&app, 24).await;

    let response = as_actor(app.server.post("/api/reviews"), &app.customer())
        .json(&json!({ "booking_id": booking_id, "rating": 6 }))
        .await;

    assert_error(&response, StatusCode::BAD_REQUEST, "validation");
    let business = app.store.stored_business(app.business.id).await.unwrap();
    assert_eq!(business.total_reviews, 0);
}
