use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/timeslots", post(handlers::slots::create_slot))
        .route("/api/timeslots/bulk", post(handlers::slots::create_slots))
        // GET takes a service id, DELETE a slot id.
        .route(
            "/api/timeslots/:id",
            get(handlers::slots::list_free_slots).delete(handlers::slots::delete_slot),
        )
}
