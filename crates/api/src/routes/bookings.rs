use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/customer/my",
            get(handlers::bookings::list_my_bookings),
        )
        .route(
            "/api/bookings/business/:id",
            get(handlers::bookings::list_business_bookings),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/cancel",
            put(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/complete",
            put(handlers::bookings::complete_booking),
        )
}
