use axum::{body::to_bytes, http::StatusCode};
use rstest::rstest;
use serde_json::Value;
use slotbook_api::middleware::error_handling::map_error;
use slotbook_core::errors::BookingError;

use crate::test_utils::TestApp;

#[rstest]
#[case::not_found(BookingError::NotFound("Booking not found".into()), StatusCode::NOT_FOUND)]
#[case::slot_unavailable(BookingError::SlotUnavailable, StatusCode::CONFLICT)]
#[case::already_cancelled(BookingError::AlreadyCancelled, StatusCode::CONFLICT)]
#[case::duplicate_review(BookingError::DuplicateReview, StatusCode::CONFLICT)]
#[case::slot_booked(BookingError::SlotBooked, StatusCode::CONFLICT)]
#[case::validation(BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
#[case::authentication(BookingError::Authentication("who".into()), StatusCode::UNAUTHORIZED)]
#[case::access_denied(BookingError::AccessDenied("no".into()), StatusCode::FORBIDDEN)]
#[case::database(BookingError::Database(eyre::eyre!("pool timed out")), StatusCode::INTERNAL_SERVER_ERROR)]
#[tokio::test]
async fn test_error_status(#[case] error: BookingError, #[case] status: StatusCode) {
    let response = map_error(error);

    assert_eq!(response.status(), status);
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let response = map_error(BookingError::Database(eyre::eyre!(
        "relation \"bookings\" does not exist"
    )));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["kind"], "internal");
    assert_eq!(body["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn test_conflict_error_body() {
    let response = map_error(BookingError::SlotUnavailable);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["kind"], "conflict");
    assert_eq!(body["error"]["message"], "Time slot is not available");
}

#[tokio::test]
async fn test_health_and_version() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");

    let response = app.server.get("/version").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["version"],
        env!("CARGO_PKG_VERSION")
    );
}
