//! # SlotBook API
//!
//! The API crate provides the web server for the SlotBook appointment
//! marketplace. It exposes the booking coordinator over HTTP: booking
//! creation and status changes, slot publishing, reviews and the payment
//! provider webhook.
//!
//! ## Architecture
//!
//! - **Routes**: API endpoints and URL structure
//! - **Handlers**: Extract the request, call the coordinator, shape the response
//! - **Middleware**: Caller identity and error-to-HTTP mapping
//! - **Notifier**: Outbound email delivery
//! - **Config**: Environment configuration
//!
//! Handlers never touch SQL. Every operation goes through
//! [`BookingCoordinator`], which runs against PostgreSQL in production and
//! the in-memory store in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Caller identity and error handling
pub mod middleware;
/// Outbound notification implementations
pub mod notifier;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use eyre::Result;
use slotbook_core::{
    coordinator::BookingCoordinator,
    notify::{NotificationQueue, Notifier},
};
use slotbook_db::{DbPool, PgStore};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::{
    middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER, WEBHOOK_SECRET_HEADER},
    notifier::{TracingNotifier, WebhookNotifier},
};

/// Shared application state that is accessible to all request handlers.
pub struct ApiState {
    pub coordinator: BookingCoordinator,
    /// Expected `x-webhook-secret` on payment callbacks; callbacks are refused when unset
    pub payment_webhook_secret: Option<String>,
}

impl ApiState {
    pub fn new(coordinator: BookingCoordinator, payment_webhook_secret: Option<String>) -> Self {
        Self {
            coordinator,
            payment_webhook_secret,
        }
    }
}

/// Installs the global log subscriber. Call once, before anything logs.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Builds the router with every endpoint and request tracing.
///
/// CORS and the request timeout are added by [`start_server`], so tests
/// can drive this router directly.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::bookings::routes())
        .merge(routes::slots::routes())
        .merge(routes::reviews::routes())
        .merge(routes::payments::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Starts the API server with the provided configuration and database
/// connection.
///
/// # Example
///
/// ```no_run
/// use slotbook_api::{config::ApiConfig, start_server};
///
/// async fn run() -> eyre::Result<()> {
///     let config = ApiConfig::from_env()?;
///     slotbook_api::init_tracing(config.log_level)?;
///     let pool = slotbook_db::create_pool(&config.database_url, config.database_max_connections).await?;
///     start_server(config, pool).await
/// }
/// ```
pub async fn start_server(config: config::ApiConfig, db_pool: DbPool) -> Result<()> {
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            info!(url = %url, "Delivering notifications to email relay");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => {
            info!("NOTIFY_WEBHOOK_URL not set, notifications will only be logged");
            Arc::new(TracingNotifier)
        }
    };
    if config.payment_webhook_secret.is_none() {
        warn!("PAYMENT_WEBHOOK_SECRET not set, payment callbacks will be rejected");
    }

    let (notifications, _worker) = NotificationQueue::spawn(notifier, config.notify_queue_capacity);

    let store = Arc::new(PgStore::new(db_pool));
    let coordinator = BookingCoordinator::new(store, notifications, config.payment_currency.clone());
    let state = Arc::new(ApiState::new(
        coordinator,
        config.payment_webhook_secret.clone(),
    ));

    let app = build_router(state);

    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let app = app.layer(
        ServiceBuilder::new().layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderName::from_static(WEBHOOK_SECRET_HEADER),
        ])
        .allow_origin(origins)
        .allow_credentials(true)
}
