use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use slotbook_core::models::review::{CreateReviewRequest, CreateReviewResponse};
use std::sync::Arc;

use crate::{
    middleware::{auth::CurrentActor, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler]
pub async fn submit_review(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateReviewResponse>), AppError> {
    let Json(payload) = payload?;

    let review = state.coordinator.submit_review(&actor, payload).await?;

    let response = CreateReviewResponse {
        message: "Review submitted successfully".to_string(),
        review,
    };

    Ok((StatusCode::CREATED, Json(response)))
}
