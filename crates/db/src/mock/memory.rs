//! In-memory [`BookingStore`] for tests.
//!
//! A unit of work takes the store-wide lock for its whole lifetime and
//! edits a private copy of the state. `commit` swaps the copy in; dropping
//! the unit of work discards it. Units of work are therefore fully
//! serialised, which is stronger than the row locks Postgres gives but
//! exercises the same coordinator code paths.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use slotbook_core::{
    errors::{BookingError, BookingResult},
    models::{
        actor::Role,
        booking::{Booking, BookingDetails, BookingFilter, BookingStatus, NewBooking},
        business::{Business, Service, User},
        payment::{NewPayment, Payment, PaymentCompletion, PaymentStatus},
        review::{NewReview, Review},
        time_slot::{SlotFilter, TimeSlot, TimeWindow},
    },
    rating::RatingSummary,
    store::{BookingStore, BookingTx},
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: HashMap<Uuid, User>,
    pub businesses: HashMap<Uuid, Business>,
    pub services: HashMap<Uuid, Service>,
    pub slots: HashMap<Uuid, TimeSlot>,
    pub bookings: HashMap<Uuid, Booking>,
    pub payments: HashMap<Uuid, Payment>,
    pub reviews: HashMap<Uuid, Review>,
}

impl MemoryState {
    fn details(&self, booking_id: Uuid) -> Option<BookingDetails> {
        let booking = self.bookings.get(&booking_id)?;
        let customer = self.users.get(&booking.customer_id)?;
        let business = self.businesses.get(&booking.business_id)?;
        let service = self.services.get(&booking.service_id)?;
        let slot = self.slots.get(&booking.timeslot_id)?;
        let payment_status = self
            .payments
            .values()
            .find(|payment| payment.booking_id == booking_id)
            .map(|payment| payment.status);

        Some(BookingDetails {
            id: booking.id,
            status: booking.status,
            customer_notes: booking.customer_notes.clone(),
            total_price: booking.total_price,
            created_at: booking.created_at,
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            business_id: business.id,
            business_name: business.name.clone(),
            business_owner_id: business.owner_id,
            service_id: service.id,
            service_name: service.name.clone(),
            timeslot_id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            payment_status,
        })
    }

    fn payment_for_booking_mut(&mut self, booking_id: Uuid) -> Option<&mut Payment> {
        self.payments
            .values_mut()
            .find(|payment| payment.booking_id == booking_id)
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_next_payment_insert: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next payment insert fail after the booking row was written.
    pub fn fail_next_payment_insert(&self) {
        self.faults
            .fail_next_payment_insert
            .store(true, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    // Seeding

    pub async fn add_user(&self, name: &str, role: Role) -> User {
        let id = Uuid::new_v4();
        let user = User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            role,
        };
        self.state.lock().await.users.insert(id, user.clone());
        user
    }

    pub async fn add_business(&self, owner_id: Uuid, name: &str) -> Business {
        let business = Business {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            is_approved: true,
            rating: Decimal::ZERO,
            total_reviews: 0,
            updated_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .businesses
            .insert(business.id, business.clone());
        business
    }

    pub async fn add_service(&self, business_id: Uuid, name: &str, price: Decimal) -> Service {
        let service = Service {
            id: Uuid::new_v4(),
            business_id,
            name: name.to_string(),
            price,
            duration_minutes: 30,
            is_active: true,
        };
        self.state
            .lock()
            .await
            .services
            .insert(service.id, service.clone());
        service
    }

    pub async fn add_slot(
        &self,
        service_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> TimeSlot {
        let now = Utc::now();
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            service_id,
            start_time,
            end_time,
            is_booked: false,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.slots.insert(slot.id, slot.clone());
        slot
    }

    /// Adds a slot of `minutes` starting `hours_from_now` hours in the future.
    pub async fn add_upcoming_slot(
        &self,
        service_id: Uuid,
        hours_from_now: i64,
        minutes: i64,
    ) -> TimeSlot {
        let start = Utc::now() + Duration::hours(hours_from_now);
        self.add_slot(service_id, start, start + Duration::minutes(minutes))
            .await
    }

    pub async fn set_service_price(&self, service_id: Uuid, price: Decimal) {
        if let Some(service) = self.state.lock().await.services.get_mut(&service_id) {
            service.price = price;
        }
    }

    pub async fn set_service_active(&self, service_id: Uuid, is_active: bool) {
        if let Some(service) = self.state.lock().await.services.get_mut(&service_id) {
            service.is_active = is_active;
        }
    }

    /// Forces a booking into `status` without any of the coordinator's checks.
    pub async fn set_booking_status(&self, booking_id: Uuid, status: BookingStatus) {
        if let Some(booking) = self.state.lock().await.bookings.get_mut(&booking_id) {
            booking.status = status;
        }
    }

    // Inspection

    pub async fn slot(&self, slot_id: Uuid) -> Option<TimeSlot> {
        self.state.lock().await.slots.get(&slot_id).cloned()
    }

    pub async fn booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.state.lock().await.bookings.get(&booking_id).cloned()
    }

    pub async fn payment(&self, booking_id: Uuid) -> Option<Payment> {
        self.state
            .lock()
            .await
            .payments
            .values()
            .find(|payment| payment.booking_id == booking_id)
            .cloned()
    }

    pub async fn stored_business(&self, business_id: Uuid) -> Option<Business> {
        self.state.lock().await.businesses.get(&business_id).cloned()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> BookingResult<Box<dyn BookingTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn list_free_slots(
        &self,
        service_id: Uuid,
        filter: SlotFilter,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<TimeSlot>> {
        let state = self.state.lock().await;
        let mut slots: Vec<TimeSlot> = state
            .slots
            .values()
            .filter(|slot| {
                slot.service_id == service_id
                    && !slot.is_booked
                    && filter.matches(slot.start_time, now)
            })
            .cloned()
            .collect();
        slots.sort_by_key(|slot| slot.start_time);
        Ok(slots)
    }

    async fn booking_details(&self, booking_id: Uuid) -> BookingResult<Option<BookingDetails>> {
        Ok(self.state.lock().await.details(booking_id))
    }

    async fn list_bookings(&self, filter: BookingFilter) -> BookingResult<Vec<BookingDetails>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<BookingDetails> = state
            .bookings
            .keys()
            .filter_map(|id| state.details(*id))
            .filter(|details| {
                filter.customer_id.is_none_or(|id| details.customer_id == id)
                    && filter.business_id.is_none_or(|id| details.business_id == id)
                    && filter.status.is_none_or(|status| details.status == status)
                    && filter
                        .date
                        .is_none_or(|date| details.start_time.date_naive() == date)
            })
            .collect();
        bookings.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(bookings)
    }

    async fn business(&self, business_id: Uuid) -> BookingResult<Option<Business>> {
        Ok(self.state.lock().await.businesses.get(&business_id).cloned())
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn user(&mut self, user_id: Uuid) -> BookingResult<Option<User>> {
        Ok(self.working.users.get(&user_id).cloned())
    }

    async fn service(&mut self, service_id: Uuid) -> BookingResult<Option<Service>> {
        Ok(self.working.services.get(&service_id).cloned())
    }

    async fn lock_service(&mut self, service_id: Uuid) -> BookingResult<Option<Service>> {
        self.service(service_id).await
    }

    async fn business(&mut self, business_id: Uuid) -> BookingResult<Option<Business>> {
        Ok(self.working.businesses.get(&business_id).cloned())
    }

    async fn lock_business(&mut self, business_id: Uuid) -> BookingResult<Option<Business>> {
        self.business(business_id).await
    }

    async fn claim_slot(
        &mut self,
        slot_id: Uuid,
        service_id: Uuid,
    ) -> BookingResult<Option<TimeSlot>> {
        let claimed = self
            .working
            .slots
            .get_mut(&slot_id)
            .filter(|slot| slot.service_id == service_id && !slot.is_booked)
            .map(|slot| {
                slot.is_booked = true;
                slot.updated_at = Utc::now();
                slot.clone()
            });
        Ok(claimed)
    }

    async fn release_slot(&mut self, slot_id: Uuid) -> BookingResult<()> {
        if let Some(slot) = self.working.slots.get_mut(&slot_id) {
            slot.is_booked = false;
            slot.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn lock_slot(&mut self, slot_id: Uuid) -> BookingResult<Option<TimeSlot>> {
        Ok(self.working.slots.get(&slot_id).cloned())
    }

    async fn find_overlapping_slot(
        &mut self,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<Option<TimeSlot>> {
        Ok(self
            .working
            .slots
            .values()
            .filter(|slot| slot.service_id == service_id)
            .find(|slot| window.overlaps(&slot.window()))
            .cloned())
    }

    async fn insert_slot(
        &mut self,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<TimeSlot> {
        let now = Utc::now();
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            service_id,
            start_time: window.start,
            end_time: window.end,
            is_booked: false,
            created_at: now,
            updated_at: now,
        };
        self.working.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn slot_has_bookings(&mut self, slot_id: Uuid) -> BookingResult<bool> {
        Ok(self
            .working
            .bookings
            .values()
            .any(|booking| booking.timeslot_id == slot_id))
    }

    async fn delete_slot(&mut self, slot_id: Uuid) -> BookingResult<()> {
        self.working.slots.remove(&slot_id);
        Ok(())
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> BookingResult<Booking> {
        let live = self.working.bookings.values().any(|existing| {
            existing.timeslot_id == booking.timeslot_id && existing.status.holds_slot()
        });
        if live {
            return Err(BookingError::Database(eyre::eyre!(
                "duplicate key value violates unique constraint \"idx_bookings_active_slot\""
            )));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: booking.customer_id,
            business_id: booking.business_id,
            service_id: booking.service_id,
            timeslot_id: booking.timeslot_id,
            status: BookingStatus::Booked,
            customer_notes: booking.customer_notes,
            total_price: booking.total_price,
            created_at: now,
            updated_at: now,
        };
        self.working.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        Ok(self.working.bookings.get(&booking_id).cloned())
    }

    async fn set_booking_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> BookingResult<Booking> {
        let booking = self
            .working
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| BookingError::Database(eyre::eyre!("no booking row {booking_id}")))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn booking_details(
        &mut self,
        booking_id: Uuid,
    ) -> BookingResult<Option<BookingDetails>> {
        Ok(self.working.details(booking_id))
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> BookingResult<Payment> {
        if self
            .faults
            .fail_next_payment_insert
            .swap(false, Ordering::SeqCst)
        {
            return Err(BookingError::Database(eyre::eyre!(
                "injected failure inserting payment"
            )));
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id: payment.booking_id,
            amount: payment.amount,
            currency: payment.currency,
            status: PaymentStatus::Pending,
            payment_method: None,
            payment_reference: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn payment_for_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Payment>> {
        Ok(self
            .working
            .payments
            .values()
            .find(|payment| payment.booking_id == booking_id)
            .cloned())
    }

    async fn payment_by_reference(&mut self, reference: &str) -> BookingResult<Option<Payment>> {
        Ok(self
            .working
            .payments
            .values()
            .find(|payment| payment.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn set_payment_reference(
        &mut self,
        payment_id: Uuid,
        reference: &str,
        payment_method: Option<&str>,
    ) -> BookingResult<Payment> {
        let payment = self
            .working
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| BookingError::Database(eyre::eyre!("no payment row {payment_id}")))?;
        payment.payment_reference = Some(reference.to_string());
        if let Some(method) = payment_method {
            payment.payment_method = Some(method.to_string());
        }
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    async fn refund_payment(&mut self, booking_id: Uuid) -> BookingResult<()> {
        if let Some(payment) = self.working.payment_for_booking_mut(booking_id) {
            payment.status = PaymentStatus::Refunded;
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_payment(&mut self, completion: PaymentCompletion) -> BookingResult<Payment> {
        let now = Utc::now();
        let existing = self
            .working
            .payment_for_booking_mut(completion.booking_id)
            .map(|payment| payment.id);
        let payment_id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                self.working.payments.insert(
                    id,
                    Payment {
                        id,
                        booking_id: completion.booking_id,
                        amount: completion.amount,
                        currency: completion.currency.clone(),
                        status: PaymentStatus::Pending,
                        payment_method: None,
                        payment_reference: None,
                        paid_at: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
                id
            }
        };
        let payment = self
            .working
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| BookingError::Database(eyre::eyre!("payment upsert lost")))?;

        payment.status = PaymentStatus::Completed;
        payment.payment_method = completion.payment_method;
        payment.payment_reference = Some(completion.payment_reference);
        payment.paid_at = Some(completion.paid_at);
        payment.updated_at = now;
        Ok(payment.clone())
    }

    async fn review_for_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Review>> {
        Ok(self
            .working
            .reviews
            .values()
            .find(|review| review.booking_id == booking_id)
            .cloned())
    }

    async fn insert_review(&mut self, review: NewReview) -> BookingResult<Review> {
        let review = Review {
            id: Uuid::new_v4(),
            booking_id: review.booking_id,
            business_id: review.business_id,
            customer_id: review.customer_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.working.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn business_ratings(&mut self, business_id: Uuid) -> BookingResult<Vec<i32>> {
        Ok(self
            .working
            .reviews
            .values()
            .filter(|review| review.business_id == business_id)
            .map(|review| review.rating)
            .collect())
    }

    async fn update_business_rating(
        &mut self,
        business_id: Uuid,
        summary: RatingSummary,
    ) -> BookingResult<()> {
        if let Some(business) = self.working.businesses.get_mut(&business_id) {
            business.rating = summary.rating;
            business.total_reviews = summary.total_reviews;
            business.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
