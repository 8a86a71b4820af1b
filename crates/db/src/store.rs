//! PostgreSQL implementation of the booking store.
//!
//! Each [`PgTx`] owns one `sqlx` transaction. Dropping it without calling
//! `commit` lets `sqlx` roll the transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotbook_core::{
    errors::BookingResult,
    models::{
        booking::{Booking, BookingDetails, BookingFilter, BookingStatus, NewBooking},
        business::{Business, Service, User},
        payment::{NewPayment, Payment, PaymentCompletion},
        review::{NewReview, Review},
        time_slot::{SlotFilter, TimeSlot, TimeWindow},
    },
    rating::RatingSummary,
    store::{BookingStore, BookingTx},
};
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::{
    repositories::{booking, business, payment, review, time_slot},
    DbPool,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn begin(&self) -> BookingResult<Box<dyn BookingTx>> {
        let tx = self.pool.begin().await.map_err(eyre::Report::from)?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn list_free_slots(
        &self,
        service_id: Uuid,
        filter: SlotFilter,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<TimeSlot>> {
        let rows = time_slot::get_free_time_slots(&self.pool, service_id, filter, now).await?;
        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    async fn booking_details(&self, booking_id: Uuid) -> BookingResult<Option<BookingDetails>> {
        let row = booking::get_booking_details(&self.pool, booking_id).await?;
        Ok(row.map(BookingDetails::try_from).transpose()?)
    }

    async fn list_bookings(&self, filter: BookingFilter) -> BookingResult<Vec<BookingDetails>> {
        let rows = booking::list_booking_details(&self.pool, filter).await?;
        let bookings = rows
            .into_iter()
            .map(BookingDetails::try_from)
            .collect::<eyre::Result<Vec<_>>>()?;
        Ok(bookings)
    }

    async fn business(&self, business_id: Uuid) -> BookingResult<Option<Business>> {
        let row = business::get_business_by_id(&self.pool, business_id).await?;
        Ok(row.map(Business::from))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTx for PgTx {
    async fn user(&mut self, user_id: Uuid) -> BookingResult<Option<User>> {
        let row = business::get_user_by_id(&mut *self.tx, user_id).await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn service(&mut self, service_id: Uuid) -> BookingResult<Option<Service>> {
        let row = business::get_service_by_id(&mut *self.tx, service_id).await?;
        Ok(row.map(Service::from))
    }

    async fn lock_service(&mut self, service_id: Uuid) -> BookingResult<Option<Service>> {
        let row = business::lock_service(&mut *self.tx, service_id).await?;
        Ok(row.map(Service::from))
    }

    async fn business(&mut self, business_id: Uuid) -> BookingResult<Option<Business>> {
        let row = business::get_business_by_id(&mut *self.tx, business_id).await?;
        Ok(row.map(Business::from))
    }

    async fn lock_business(&mut self, business_id: Uuid) -> BookingResult<Option<Business>> {
        let row = business::lock_business(&mut *self.tx, business_id).await?;
        Ok(row.map(Business::from))
    }

    async fn claim_slot(
        &mut self,
        slot_id: Uuid,
        service_id: Uuid,
    ) -> BookingResult<Option<TimeSlot>> {
        let row = time_slot::claim_time_slot(&mut *self.tx, slot_id, service_id).await?;
        if row.is_none() {
            debug!(timeslot_id = %slot_id, "Slot claim lost or slot missing");
        }
        Ok(row.map(TimeSlot::from))
    }

    async fn release_slot(&mut self, slot_id: Uuid) -> BookingResult<()> {
        time_slot::release_time_slot(&mut *self.tx, slot_id).await?;
        Ok(())
    }

    async fn lock_slot(&mut self, slot_id: Uuid) -> BookingResult<Option<TimeSlot>> {
        let row = time_slot::lock_time_slot(&mut *self.tx, slot_id).await?;
        Ok(row.map(TimeSlot::from))
    }

    async fn find_overlapping_slot(
        &mut self,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<Option<TimeSlot>> {
        let row = time_slot::find_overlapping_time_slot(&mut *self.tx, service_id, window).await?;
        Ok(row.map(TimeSlot::from))
    }

    async fn insert_slot(
        &mut self,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<TimeSlot> {
        let row = time_slot::create_time_slot(&mut *self.tx, service_id, window).await?;
        Ok(row.into())
    }

    async fn slot_has_bookings(&mut self, slot_id: Uuid) -> BookingResult<bool> {
        Ok(time_slot::time_slot_has_bookings(&mut *self.tx, slot_id).await?)
    }

    async fn delete_slot(&mut self, slot_id: Uuid) -> BookingResult<()> {
        time_slot::delete_time_slot(&mut *self.tx, slot_id).await?;
        Ok(())
    }

    async fn insert_booking(&mut self, new_booking: NewBooking) -> BookingResult<Booking> {
        let row = booking::create_booking(&mut *self.tx, new_booking).await?;
        Ok(row.try_into()?)
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        let row = booking::lock_booking(&mut *self.tx, booking_id).await?;
        Ok(row.map(Booking::try_from).transpose()?)
    }

    async fn set_booking_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> BookingResult<Booking> {
        let row = booking::update_booking_status(&mut *self.tx, booking_id, status).await?;
        Ok(row.try_into()?)
    }

    async fn booking_details(
        &mut self,
        booking_id: Uuid,
    ) -> BookingResult<Option<BookingDetails>> {
        let row = booking::get_booking_details(&mut *self.tx, booking_id).await?;
        Ok(row.map(BookingDetails::try_from).transpose()?)
    }

    async fn insert_payment(&mut self, new_payment: NewPayment) -> BookingResult<Payment> {
        let row = payment::create_payment(&mut *self.tx, new_payment).await?;
        Ok(row.try_into()?)
    }

    async fn payment_for_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Payment>> {
        let row = payment::get_payment_by_booking_id(&mut *self.tx, booking_id).await?;
        Ok(row.map(Payment::try_from).transpose()?)
    }

    async fn payment_by_reference(&mut self, reference: &str) -> BookingResult<Option<Payment>> {
        let row = payment::get_payment_by_reference(&mut *self.tx, reference).await?;
        Ok(row.map(Payment::try_from).transpose()?)
    }

    async fn set_payment_reference(
        &mut self,
        payment_id: Uuid,
        reference: &str,
        payment_method: Option<&str>,
    ) -> BookingResult<Payment> {
        let row =
            payment::set_payment_reference(&mut *self.tx, payment_id, reference, payment_method)
                .await?;
        Ok(row.try_into()?)
    }

    async fn refund_payment(&mut self, booking_id: Uuid) -> BookingResult<()> {
        payment::refund_payment(&mut *self.tx, booking_id).await?;
        Ok(())
    }

    async fn complete_payment(&mut self, completion: PaymentCompletion) -> BookingResult<Payment> {
        let row = payment::complete_payment(&mut *self.tx, completion).await?;
        Ok(row.try_into()?)
    }

    async fn review_for_booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Review>> {
        let row = review::get_review_by_booking_id(&mut *self.tx, booking_id).await?;
        Ok(row.map(Review::from))
    }

    async fn insert_review(&mut self, new_review: NewReview) -> BookingResult<Review> {
        let row = review::create_review(&mut *self.tx, new_review).await?;
        Ok(row.into())
    }

    async fn business_ratings(&mut self, business_id: Uuid) -> BookingResult<Vec<i32>> {
        Ok(review::get_ratings_by_business_id(&mut *self.tx, business_id).await?)
    }

    async fn update_business_rating(
        &mut self,
        business_id: Uuid,
        summary: RatingSummary,
    ) -> BookingResult<()> {
        business::update_business_rating(&mut *self.tx, business_id, summary).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await.map_err(eyre::Report::from)?;
        Ok(())
    }
}
