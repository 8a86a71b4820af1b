//! # Persistence seam
//!
//! [`BookingStore`] hands out units of work ([`BookingTx`]). Every method
//! on a unit of work runs inside one database transaction; nothing is
//! visible to other callers until [`BookingTx::commit`] succeeds, and a
//! unit of work dropped without commit rolls back.
//!
//! Methods prefixed `lock_` and [`BookingTx::claim_slot`] acquire
//! exclusive access to the row for the rest of the unit of work. Those
//! are the only primitives the coordinator uses to serialise concurrent
//! requests touching the same slot, booking, service or business.
//! Payment rows are only mutated while the owning booking is locked, so
//! booking-then-payment is the single lock order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    errors::BookingResult,
    models::{
        booking::{Booking, BookingDetails, BookingFilter, BookingStatus, NewBooking},
        business::{Business, Service, User},
        payment::{NewPayment, Payment, PaymentCompletion},
        review::{NewReview, Review},
        time_slot::{SlotFilter, TimeSlot, TimeWindow},
    },
    rating::RatingSummary,
};

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Opens a new unit of work.
    async fn begin(&self) -> BookingResult<Box<dyn BookingTx>>;

    async fn list_free_slots(
        &self,
        service_id: Uuid,
        filter: SlotFilter,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<TimeSlot>>;

    async fn booking_details(&self, booking_id: Uuid) -> BookingResult<Option<BookingDetails>>;

    /// Ordered by slot start time, latest first.
    async fn list_bookings(&self, filter: BookingFilter) -> BookingResult<Vec<BookingDetails>>;

    async fn business(&self, business_id: Uuid) -> BookingResult<Option<Business>>;
}

#[async_trait]
pub trait BookingTx: Send {
    async fn user(&mut self, user_id: Uuid) -> BookingResult<Option<User>>;

    async fn service(&mut self, service_id: Uuid) -> BookingResult<Option<Service>>;

    async fn lock_service(&mut self, service_id: Uuid) -> BookingResult<Option<Service>>;

    async fn business(&mut self, business_id: Uuid) -> BookingResult<Option<Business>>;

    async fn lock_business(&mut self, business_id: Uuid) -> BookingResult<Option<Business>>;

    // Slots

    /// Atomically flips the slot's booked flag from false to true.
    /// Returns `None` when the slot does not exist, belongs to another
    /// service, or is already booked.
    async fn claim_slot(
        &mut self,
        slot_id: Uuid,
        service_id: Uuid,
    ) -> BookingResult<Option<TimeSlot>>;

    async fn release_slot(&mut self, slot_id: Uuid) -> BookingResult<()>;

    async fn lock_slot(&mut self, slot_id: Uuid) -> BookingResult<Option<TimeSlot>>;

    async fn find_overlapping_slot(
        &mut self,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<Option<TimeSlot>>;

    async fn insert_slot(
        &mut self,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<TimeSlot>;

    async fn slot_has_bookings(&mut self, slot_id: Uuid) -> BookingResult<bool>;

    async fn delete_slot(&mut self, slot_id: Uuid) -> BookingResult<()>;

    // Bookings

    async fn insert_booking(&mut self, booking: NewBooking) -> BookingResult<Booking>;

    async fn lock_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Booking>>;

    async fn set_booking_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> BookingResult<Booking>;

    async fn booking_details(
        &mut self,
        booking_id: Uuid,
    ) -> BookingResult<Option<BookingDetails>>;

    // Payments

    async fn insert_payment(&mut self, payment: NewPayment) -> BookingResult<Payment>;

    async fn payment_for_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Payment>>;

    async fn payment_by_reference(&mut self, reference: &str) -> BookingResult<Option<Payment>>;

    async fn set_payment_reference(
        &mut self,
        payment_id: Uuid,
        reference: &str,
        payment_method: Option<&str>,
    ) -> BookingResult<Payment>;

    /// Marks the booking's payment refunded regardless of its current status.
    async fn refund_payment(&mut self, booking_id: Uuid) -> BookingResult<()>;

    /// Upserts the payment keyed by booking into the completed state.
    async fn complete_payment(&mut self, completion: PaymentCompletion) -> BookingResult<Payment>;

    // Reviews

    async fn review_for_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Review>>;

    async fn insert_review(&mut self, review: NewReview) -> BookingResult<Review>;

    async fn business_ratings(&mut self, business_id: Uuid) -> BookingResult<Vec<i32>>;

    async fn update_business_rating(
        &mut self,
        business_id: Uuid,
        summary: RatingSummary,
    ) -> BookingResult<()>;

    async fn commit(self: Box<Self>) -> BookingResult<()>;
}
