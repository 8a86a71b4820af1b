use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use slotbook_core::models::booking::{
    BookingListQuery, BookingListResponse, BookingUpdateResponse, CreateBookingRequest,
    CreateBookingResponse, GetBookingResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::CurrentActor, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let Json(payload) = payload?;

    let receipt = state.coordinator.create_booking(actor.id, payload).await?;

    let response = CreateBookingResponse {
        message: "Booking created successfully".to_string(),
        booking: receipt.details,
        payment: receipt.payment,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<GetBookingResponse>, AppError> {
    let Path(id) = id?;

    let booking = state.coordinator.get_booking(&actor, id).await?;

    Ok(Json(GetBookingResponse { booking }))
}

#[axum::debug_handler]
pub async fn list_my_bookings(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    query: Result<Query<BookingListQuery>, QueryRejection>,
) -> Result<Json<BookingListResponse>, AppError> {
    let Query(query) = query?;

    let bookings = state
        .coordinator
        .list_customer_bookings(&actor, query)
        .await?;

    Ok(Json(BookingListResponse { bookings }))
}

#[axum::debug_handler]
pub async fn list_business_bookings(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    business_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<BookingListQuery>, QueryRejection>,
) -> Result<Json<BookingListResponse>, AppError> {
    let Path(business_id) = business_id?;
    let Query(query) = query?;

    let bookings = state
        .coordinator
        .list_business_bookings(&actor, business_id, query)
        .await?;

    Ok(Json(BookingListResponse { bookings }))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingUpdateResponse>, AppError> {
    let Path(id) = id?;

    let booking = state.coordinator.cancel_booking(&actor, id).await?;

    Ok(Json(BookingUpdateResponse {
        message: "Booking cancelled successfully".to_string(),
        booking,
    }))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingUpdateResponse>, AppError> {
    let Path(id) = id?;

    let booking = state.coordinator.complete_booking(&actor, id).await?;

    Ok(Json(BookingUpdateResponse {
        message: "Booking marked as completed".to_string(),
        booking,
    }))
}
