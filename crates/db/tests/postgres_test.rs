//! Runs the coordinator against a real database.
//!
//! `cargo test -p slotbook-db -- --ignored` with `TEST_DATABASE_URL` set.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use slotbook_core::{
    coordinator::BookingCoordinator,
    errors::BookingError,
    models::{
        actor::Actor,
        booking::{BookingStatus, CreateBookingRequest},
        payment::PaymentStatus,
        time_slot::TimeSlotQuery,
    },
    notify::NotificationQueue,
};
use slotbook_db::{
    mock::{create_test_pool, RecordingNotifier},
    repositories::{payment, time_slot},
    DbPool, PgStore,
};
use std::sync::Arc;
use uuid::Uuid;

struct Seed {
    customer_id: Uuid,
    owner_id: Uuid,
    business_id: Uuid,
    service_id: Uuid,
    slot_id: Uuid,
}

async fn seed(pool: &DbPool) -> Seed {
    let customer_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let business_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();

    for (id, role) in [(customer_id, "customer"), (owner_id, "business")] {
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(format!("{role} {id}"))
            .bind(format!("{id}@example.com"))
            .bind(role)
            .execute(pool)
            .await
            .unwrap();
    }

    sqlx::query("INSERT INTO businesses (id, user_id, name, is_approved) VALUES ($1, $2, $3, TRUE)")
        .bind(business_id)
        .bind(owner_id)
        .bind("Test Studio")
        .execute(pool)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO services (id, business_id, service_name, price, duration) \
         VALUES ($1, $2, $3, $4, 30)",
    )
    .bind(service_id)
    .bind(business_id)
    .bind("Massage")
    .bind(Decimal::new(50000, 0))
    .execute(pool)
    .await
    .unwrap();

    let start = Utc::now() + Duration::days(30);
    sqlx::query(
        "INSERT INTO time_slots (id, service_id, start_time, end_time) VALUES ($1, $2, $3, $4)",
    )
    .bind(slot_id)
    .bind(service_id)
    .bind(start)
    .bind(start + Duration::minutes(30))
    .execute(pool)
    .await
    .unwrap();

    Seed {
        customer_id,
        owner_id,
        business_id,
        service_id,
        slot_id,
    }
}

fn coordinator(pool: &DbPool) -> BookingCoordinator {
    let (queue, _worker) = NotificationQueue::spawn(Arc::new(RecordingNotifier::new()), 16);
    BookingCoordinator::new(Arc::new(PgStore::new(pool.clone())), queue, "usd")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_conditional_claim_has_one_winner() {
    let pool = create_test_pool().await.unwrap();
    let seed = seed(&pool).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let (slot_id, service_id) = (seed.slot_id, seed.service_id);
        handles.push(tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let claimed = time_slot::claim_time_slot(&mut *tx, slot_id, service_id)
                .await
                .unwrap();
            tx.commit().await.unwrap();
            claimed.is_some()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_booking_lifecycle_against_postgres() {
    let pool = create_test_pool().await.unwrap();
    let seed = seed(&pool).await;
    let coordinator = coordinator(&pool);

    let request = CreateBookingRequest {
        business_id: seed.business_id,
        service_id: seed.service_id,
        timeslot_id: seed.slot_id,
        customer_notes: Some("Window seat".to_string()),
    };
    let receipt = coordinator
        .create_booking(seed.customer_id, request.clone())
        .await
        .unwrap();
    assert_eq!(receipt.booking.total_price, Decimal::new(50000, 0));
    assert_eq!(receipt.details.payment_status, Some(PaymentStatus::Pending));

    let again = coordinator.create_booking(seed.customer_id, request).await;
    assert!(matches!(again, Err(BookingError::SlotUnavailable)));

    let free = coordinator
        .list_free_slots(seed.service_id, &TimeSlotQuery::default())
        .await
        .unwrap();
    assert!(free.iter().all(|slot| slot.id != seed.slot_id));

    let cancelled = coordinator
        .cancel_booking(&Actor::business(seed.owner_id), receipt.booking.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let refunded = payment::get_payment_by_booking_id(&pool, receipt.booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refunded.status, "refunded");

    let slot = time_slot::lock_time_slot(&pool, seed.slot_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!slot.is_booked);
}
