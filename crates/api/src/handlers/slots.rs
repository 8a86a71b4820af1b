use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use slotbook_core::{
    errors::BookingResult,
    models::{
        time_slot::{
            BulkCreateTimeSlotsRequest, CreateTimeSlotRequest, TimeSlotQuery, TimeSlotResponse,
            TimeSlotsResponse, TimeWindow,
        },
        MessageResponse,
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::CurrentActor, error_handling::AppError},
    ApiState,
};

/// Free slots of a service. Public; no actor required.
#[axum::debug_handler]
pub async fn list_free_slots(
    State(state): State<Arc<ApiState>>,
    service_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<TimeSlotQuery>, QueryRejection>,
) -> Result<Json<TimeSlotsResponse>, AppError> {
    let Path(service_id) = service_id?;
    let Query(query) = query?;

    let time_slots = state
        .coordinator
        .list_free_slots(service_id, &query)
        .await?;

    Ok(Json(TimeSlotsResponse { time_slots }))
}

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<CreateTimeSlotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TimeSlotResponse>), AppError> {
    let Json(payload) = payload?;
    let window = TimeWindow::new(payload.start_time, payload.end_time)?;

    let time_slot = state
        .coordinator
        .create_slot(&actor, payload.service_id, window)
        .await?;

    let response = TimeSlotResponse {
        message: "Time slot created successfully".to_string(),
        time_slot,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn create_slots(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<BulkCreateTimeSlotsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TimeSlotsResponse>), AppError> {
    let Json(payload) = payload?;
    let windows = payload
        .slots
        .iter()
        .map(|slot| TimeWindow::new(slot.start_time, slot.end_time))
        .collect::<BookingResult<Vec<_>>>()?;

    let time_slots = state
        .coordinator
        .create_slots(&actor, payload.service_id, windows)
        .await?;

    Ok((StatusCode::CREATED, Json(TimeSlotsResponse { time_slots })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;

    state.coordinator.delete_slot(&actor, id).await?;

    Ok(Json(MessageResponse::new("Time slot deleted successfully")))
}
