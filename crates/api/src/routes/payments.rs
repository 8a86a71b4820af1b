use axum::{routing::post, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/payments/reference",
            post(handlers::payments::attach_reference),
        )
        .route(
            "/api/payments/webhook",
            post(handlers::payments::payment_webhook),
        )
}
