use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestResponse, TestServer};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use slotbook_api::{
    build_router,
    middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER, WEBHOOK_SECRET_HEADER},
    ApiState,
};
use slotbook_core::{
    coordinator::BookingCoordinator,
    models::{
        actor::{Actor, Role},
        business::{Business, Service, User},
        time_slot::TimeSlot,
    },
    notify::{NotificationQueue, Notifier},
};
use slotbook_db::mock::{MemoryStore, RecordingNotifier};

pub const WEBHOOK_SECRET: &str = "whsec_test";

/// The full router wired to an in-memory store with one customer, one
/// business owner and one service already seeded.
pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
    pub notifier: RecordingNotifier,
    pub customer: User,
    pub owner: User,
    pub business: Business,
    pub service: Service,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_webhook_secret(Some(WEBHOOK_SECRET)).await
    }

    pub async fn with_webhook_secret(secret: Option<&str>) -> Self {
        let notifier = RecordingNotifier::new();
        Self::build(secret, notifier.clone(), Arc::new(notifier)).await
    }

    /// Delivers notifications to `delivery`; `self.notifier` then stays empty.
    pub async fn with_notifier(delivery: Arc<dyn Notifier>) -> Self {
        Self::build(Some(WEBHOOK_SECRET), RecordingNotifier::new(), delivery).await
    }

    async fn build(
        secret: Option<&str>,
        notifier: RecordingNotifier,
        delivery: Arc<dyn Notifier>,
    ) -> Self {
        let store = MemoryStore::new();
        let (queue, _worker) = NotificationQueue::spawn(delivery, 16);
        let coordinator = BookingCoordinator::new(Arc::new(store.clone()), queue, "usd");
        let state = Arc::new(ApiState::new(coordinator, secret.map(str::to_string)));

        let server = TestServer::new(build_router(state)).unwrap();

        let customer = store.add_user("Jane Customer", Role::Customer).await;
        let owner = store.add_user("Bob Owner", Role::Business).await;
        let business = store.add_business(owner.id, "Bob's Barbers").await;
        let service = store
            .add_service(business.id, "Haircut", Decimal::new(50000, 0))
            .await;

        Self {
            server,
            store,
            notifier,
            customer,
            owner,
            business,
            service,
        }
    }

    pub fn customer(&self) -> Actor {
        Actor::customer(self.customer.id)
    }

    pub fn owner(&self) -> Actor {
        Actor::business(self.owner.id)
    }

    pub async fn upcoming_slot(&self, hours_from_now: i64) -> TimeSlot {
        self.store
            .add_upcoming_slot(self.service.id, hours_from_now, 30)
            .await
    }

    pub fn booking_body(&self, slot: &TimeSlot) -> Value {
        json!({
            "business_id": self.business.id,
            "service_id": self.service.id,
            "timeslot_id": slot.id,
            "customer_notes": "First visit",
        })
    }

    /// Posts a payment provider callback carrying the configured secret.
    pub async fn payment_webhook(&self, event: &Value) -> TestResponse {
        self.server
            .post("/api/payments/webhook")
            .add_header(
                HeaderName::from_static(WEBHOOK_SECRET_HEADER),
                HeaderValue::from_static(WEBHOOK_SECRET),
            )
            .json(event)
            .await
    }

    /// Books `slot` for the seeded customer and returns the booking id.
    pub async fn book(&self, slot: &TimeSlot) -> String {
        let response = as_actor(self.server.post("/api/bookings"), &self.customer())
            .json(&self.booking_body(slot))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["booking"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

/// Adds the gateway identity headers for `actor`.
pub fn as_actor(request: TestRequest, actor: &Actor) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&actor.id.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_static(actor.role.as_str()),
        )
}

/// Asserts the status and the `error.kind` of an error envelope.
pub fn assert_error(response: &TestResponse, status: StatusCode, kind: &str) {
    response.assert_status(status);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["kind"], kind, "unexpected body: {body}");
    assert!(body["error"]["message"].is_string());
}
