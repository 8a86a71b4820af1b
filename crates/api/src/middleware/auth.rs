//! # Authentication Module
//!
//! Credentials are verified by the upstream auth gateway, which forwards
//! the caller's identity in two headers:
//!
//! - `x-user-id`: the account UUID
//! - `x-user-role`: `customer`, `business` or `admin`
//!
//! [`CurrentActor`] turns those headers into an [`Actor`] for handlers.
//! Missing or malformed headers are rejected with 401.
//!
//! The payment webhook is called by the payment provider rather than a
//! user; it is guarded by a shared secret instead.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use slotbook_core::{
    errors::{BookingError, BookingResult},
    models::actor::{Actor, Role},
};
use uuid::Uuid;

use super::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// The authenticated caller of a request.
///
/// # Example
///
/// ```no_run
/// use axum::Json;
/// use slotbook_api::middleware::auth::CurrentActor;
/// use uuid::Uuid;
///
/// async fn whoami(CurrentActor(actor): CurrentActor) -> Json<Uuid> {
///     Json(actor.id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
            .map(CurrentActor)
            .map_err(AppError)
    }
}

/// Reads the gateway identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> BookingResult<Actor> {
    let id = header_str(headers, USER_ID_HEADER)?
        .parse::<Uuid>()
        .map_err(|_| BookingError::Authentication(format!("Invalid {USER_ID_HEADER} header")))?;
    let role = header_str(headers, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|_| BookingError::Authentication(format!("Invalid {USER_ROLE_HEADER} header")))?;

    Ok(Actor::new(id, role))
}

/// Checks the shared secret sent with payment provider callbacks.
/// Without a configured secret every callback is rejected.
pub fn verify_webhook_secret(headers: &HeaderMap, expected: Option<&str>) -> BookingResult<()> {
    let Some(expected) = expected else {
        return Err(BookingError::Authentication(
            "Payment webhook is not configured".to_string(),
        ));
    };

    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(BookingError::Authentication(
            "Invalid webhook secret".to_string(),
        ))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> BookingResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BookingError::Authentication(format!("Missing {name} header")))
}
