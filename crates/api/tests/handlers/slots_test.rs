use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use slotbook_core::models::{
    actor::Actor,
    time_slot::{TimeSlotResponse, TimeSlotsResponse},
};
use uuid::Uuid;

use crate::test_utils::{as_actor, assert_error, TestApp};

fn window(hours_from_now: i64, minutes: i64) -> Value {
    let start = Utc::now() + Duration::hours(hours_from_now);
    json!({
        "start_time": start,
        "end_time": start + Duration::minutes(minutes),
    })
}

#[tokio::test]
async fn test_list_free_slots_is_public() {
    let app = TestApp::new().await;
    let free = app.upcoming_slot(24).await;
    let taken = app.upcoming_slot(48).await;
    app.book(&taken).await;
    app.store
        .add_upcoming_slot(app.service.id, -24, 30)
        .await;

    let response = app
        .server
        .get(&format!("/api/timeslots/{}", app.service.id))
        .await;

    response.assert_status_ok();
    let slots = response.json::<TimeSlotsResponse>().time_slots;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].id, free.id);
}

#[tokio::test]
async fn test_list_free_slots_by_date() {
    let app = TestApp::new().await;
    let slot = app.upcoming_slot(72).await;
    let date = slot.start_time.date_naive();

    let response = app
        .server
        .get(&format!("/api/timeslots/{}?date={date}", app.service.id))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<TimeSlotsResponse>().time_slots.len(), 1);

    let response = app
        .server
        .get(&format!(
            "/api/timeslots/{}?start_date={}&end_date={}",
            app.service.id,
            date.succ_opt().unwrap(),
            date
        ))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "validation");
}

#[tokio::test]
async fn test_create_slot() {
    let app = TestApp::new().await;
    let mut body = window(24, 30);
    body["service_id"] = json!(app.service.id);

    let response = as_actor(app.server.post("/api/timeslots"), &app.owner())
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    let created = response.json::<TimeSlotResponse>();
    assert_eq!(created.message, "Time slot created successfully");
    assert_eq!(created.time_slot.service_id, app.service.id);
    assert!(!created.time_slot.is_booked);
    assert!(app.store.slot(created.time_slot.id).await.is_some());

    // Same window again overlaps the slot just created.
    let response = as_actor(app.server.post("/api/timeslots"), &app.owner())
        .json(&body)
        .await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[tokio::test]
async fn test_create_slot_rules() {
    let app = TestApp::new().await;
    let mut body = window(24, 30);
    body["service_id"] = json!(app.service.id);

    let response = as_actor(app.server.post("/api/timeslots"), &app.customer())
        .json(&body)
        .await;
    assert_error(&response, StatusCode::FORBIDDEN, "access_denied");

    let mut inverted = body.clone();
    inverted["end_time"] = body["start_time"].clone();
    let response = as_actor(app.server.post("/api/timeslots"), &app.owner())
        .json(&inverted)
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "validation");

    let mut unknown = body.clone();
    unknown["service_id"] = json!(Uuid::new_v4());
    let response = as_actor(app.server.post("/api/timeslots"), &app.owner())
        .json(&unknown)
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_bulk_create_slots() {
    let app = TestApp::new().await;

    let response = as_actor(app.server.post("/api/timeslots/bulk"), &app.owner())
        .json(&json!({
            "service_id": app.service.id,
            "slots": [window(24, 30), window(25, 30)],
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<TimeSlotsResponse>().time_slots.len(), 2);
}

#[tokio::test]
async fn test_bulk_create_is_all_or_nothing() {
    let app = TestApp::new().await;
    let existing = app.upcoming_slot(30).await;

    let clash = json!({
        "start_time": existing.start_time,
        "end_time": existing.end_time,
    });
    let response = as_actor(app.server.post("/api/timeslots/bulk"), &app.owner())
        .json(&json!({
            "service_id": app.service.id,
            "slots": [window(24, 30), clash],
        }))
        .await;

    assert_error(&response, StatusCode::CONFLICT, "conflict");
    assert_eq!(app.store.snapshot().await.slots.len(), 1);
}

#[tokio::test]
async fn test_delete_slot() {
    let app = TestApp::new().await;
    let free = app.upcoming_slot(24).await;
    let booked = app.upcoming_slot(48).await;
    app.book(&booked).await;

    let response = as_actor(
        app.server.delete(&format!("/api/timeslots/{}", booked.id)),
        &app.owner(),
    )
    .await;
    assert_error(&response, StatusCode::CONFLICT, "conflict");

    let rival = Actor::business(Uuid::new_v4());
    let response = as_actor(
        app.server.delete(&format!("/api/timeslots/{}", free.id)),
        &rival,
    )
    .await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");

    let response = as_actor(
        app.server.delete(&format!("/api/timeslots/{}", free.id)),
        &app.owner(),
    )
    .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "Time slot deleted successfully"
    );
    assert!(app.store.slot(free.id).await.is_none());
}
