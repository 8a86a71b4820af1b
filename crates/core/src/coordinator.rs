//! # Booking Transaction Coordinator
//!
//! Every multi-row operation of the marketplace runs here as a single unit
//! of work against the [`BookingStore`]. An operation either commits all of
//! its writes or none of them: early returns drop the unit of work, which
//! rolls it back.
//!
//! ## Locking
//!
//! - Booking creation claims the slot with [`BookingTx::claim_slot`], a
//!   conditional update that only succeeds while the slot is free. Two
//!   concurrent requests for one slot cannot both get past it.
//! - Cancel, complete, review and payment operations lock the booking row
//!   first and touch its payment only afterwards.
//! - Slot creation locks the service row so overlap checks are not raced.
//! - Review submission locks the business row so the rating aggregate is
//!   recomputed from a review set no concurrent submission can change.
//!
//! Notifications are queued only after commit and never affect the result.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        actor::{Actor, Role},
        booking::{
            Booking, BookingDetails, BookingFilter, BookingListQuery, BookingReceipt,
            BookingStatus, CreateBookingRequest, NewBooking,
        },
        payment::{
            AttachPaymentReferenceRequest, NewPayment, Payment, PaymentCompletion,
            PaymentEventOutcome, PaymentStatus, PaymentSucceededEvent,
        },
        review::{validate_rating, CreateReviewRequest, NewReview, Review},
        time_slot::{SlotFilter, TimeSlot, TimeSlotQuery, TimeWindow},
    },
    notify::{Notification, NotificationQueue},
    rating::RatingSummary,
    store::{BookingStore, BookingTx},
};

pub struct BookingCoordinator {
    store: Arc<dyn BookingStore>,
    notifications: NotificationQueue,
    currency: String,
}

impl BookingCoordinator {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifications: NotificationQueue,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifications,
            currency: currency.into(),
        }
    }

    /// Reserves a slot for `customer_id` and records the booking and its
    /// pending payment.
    ///
    /// # Errors
    ///
    /// * `SlotUnavailable` - the slot is missing, belongs to another service,
    ///   or is already booked
    /// * `NotFound` - unknown customer, or unknown/inactive service
    /// * `Validation` - the service does not belong to the business
    pub async fn create_booking(
        &self,
        customer_id: Uuid,
        request: CreateBookingRequest,
    ) -> BookingResult<BookingReceipt> {
        let mut tx = self.store.begin().await?;

        if tx.user(customer_id).await?.is_none() {
            return Err(BookingError::NotFound("Customer not found".to_string()));
        }

        let slot = tx
            .claim_slot(request.timeslot_id, request.service_id)
            .await?
            .ok_or(BookingError::SlotUnavailable)?;

        let service = tx
            .service(request.service_id)
            .await?
            .filter(|service| service.is_active)
            .ok_or_else(|| BookingError::NotFound("Service not found".to_string()))?;

        if service.business_id != request.business_id {
            return Err(BookingError::Validation(
                "Service does not belong to the given business".to_string(),
            ));
        }

        let booking = tx
            .insert_booking(NewBooking {
                customer_id,
                business_id: request.business_id,
                service_id: service.id,
                timeslot_id: slot.id,
                customer_notes: normalize_text(request.customer_notes),
                total_price: service.price,
            })
            .await?;

        let payment = tx
            .insert_payment(NewPayment {
                booking_id: booking.id,
                amount: booking.total_price,
                currency: self.currency.clone(),
            })
            .await?;

        let details = details_in(&mut *tx, booking.id).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            timeslot_id = %slot.id,
            customer_id = %customer_id,
            "Booking created"
        );
        self.notifications
            .enqueue(Notification::BookingConfirmed(details.clone()));

        Ok(BookingReceipt {
            booking,
            payment,
            details,
        })
    }

    /// Cancels a booking, frees its slot and marks its payment refunded.
    pub async fn cancel_booking(&self, actor: &Actor, booking_id: Uuid) -> BookingResult<Booking> {
        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(booking_not_found)?;
        let business = tx
            .business(booking.business_id)
            .await?
            .ok_or_else(booking_not_found)?;

        let permitted =
            actor.is_admin() || actor.id == booking.customer_id || actor.id == business.owner_id;
        if !permitted {
            debug!(booking_id = %booking_id, actor_id = %actor.id, "Cancel denied");
            return Err(BookingError::AccessDenied("Access denied".to_string()));
        }

        match booking.status {
            BookingStatus::Cancelled => return Err(BookingError::AlreadyCancelled),
            status if status.is_terminal() => {
                return Err(BookingError::Conflict(format!(
                    "Cannot cancel a {status} booking"
                )));
            }
            _ => {}
        }

        let cancelled = tx
            .set_booking_status(booking_id, BookingStatus::Cancelled)
            .await?;
        tx.release_slot(booking.timeslot_id).await?;
        tx.refund_payment(booking_id).await?;

        let details = details_in(&mut *tx, booking_id).await?;
        tx.commit().await?;

        info!(booking_id = %booking_id, actor_id = %actor.id, "Booking cancelled");
        self.notifications
            .enqueue(Notification::BookingCancelled(details));

        Ok(cancelled)
    }

    /// Marks a booking completed. The slot stays booked.
    ///
    /// A booking owned by another business is reported as not found.
    pub async fn complete_booking(
        &self,
        actor: &Actor,
        booking_id: Uuid,
    ) -> BookingResult<Booking> {
        require_role(actor, Role::Business)?;

        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(booking_not_found)?;
        let owned = tx
            .business(booking.business_id)
            .await?
            .is_some_and(|business| business.owner_id == actor.id);
        if !owned {
            return Err(booking_not_found());
        }

        if !matches!(
            booking.status,
            BookingStatus::Booked | BookingStatus::Confirmed
        ) {
            return Err(BookingError::Conflict(format!(
                "Cannot complete a {} booking",
                booking.status
            )));
        }

        let completed = tx
            .set_booking_status(booking_id, BookingStatus::Completed)
            .await?;
        tx.commit().await?;

        info!(booking_id = %booking_id, "Booking completed");
        Ok(completed)
    }

    /// Records a review for a completed booking and recomputes the
    /// business rating from every review the business has.
    pub async fn submit_review(
        &self,
        actor: &Actor,
        request: CreateReviewRequest,
    ) -> BookingResult<Review> {
        validate_rating(request.rating)?;

        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(request.booking_id)
            .await?
            .filter(|booking| {
                booking.customer_id == actor.id && booking.status == BookingStatus::Completed
            })
            .ok_or_else(|| BookingError::NotFound("Completed booking not found".to_string()))?;

        if tx.review_for_booking(booking.id).await?.is_some() {
            return Err(BookingError::DuplicateReview);
        }

        tx.lock_business(booking.business_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Business not found".to_string()))?;

        let review = tx
            .insert_review(NewReview {
                booking_id: booking.id,
                business_id: booking.business_id,
                customer_id: actor.id,
                rating: request.rating,
                comment: normalize_text(request.comment),
            })
            .await?;

        let ratings = tx.business_ratings(booking.business_id).await?;
        let summary = RatingSummary::from_ratings(&ratings)?;
        tx.update_business_rating(booking.business_id, summary)
            .await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            business_id = %booking.business_id,
            rating = %summary.rating,
            total_reviews = summary.total_reviews,
            "Review submitted"
        );
        Ok(review)
    }

    pub async fn list_free_slots(
        &self,
        service_id: Uuid,
        query: &TimeSlotQuery,
    ) -> BookingResult<Vec<TimeSlot>> {
        let filter = SlotFilter::from_query(query)?;
        self.store
            .list_free_slots(service_id, filter, Utc::now())
            .await
    }

    pub async fn create_slot(
        &self,
        actor: &Actor,
        service_id: Uuid,
        window: TimeWindow,
    ) -> BookingResult<TimeSlot> {
        let mut slots = self.create_slots(actor, service_id, vec![window]).await?;
        slots
            .pop()
            .ok_or_else(|| BookingError::Internal("no slot created".into()))
    }

    /// Publishes several windows at once; either all are created or none.
    pub async fn create_slots(
        &self,
        actor: &Actor,
        service_id: Uuid,
        windows: Vec<TimeWindow>,
    ) -> BookingResult<Vec<TimeSlot>> {
        require_role(actor, Role::Business)?;

        if windows.is_empty() {
            return Err(BookingError::Validation(
                "At least one time slot is required".to_string(),
            ));
        }
        for (index, window) in windows.iter().enumerate() {
            if windows[..index].iter().any(|other| window.overlaps(other)) {
                return Err(BookingError::Conflict(
                    "Requested time slots overlap each other".to_string(),
                ));
            }
        }

        let mut tx = self.store.begin().await?;

        let service = tx
            .lock_service(service_id)
            .await?
            .ok_or_else(service_not_found)?;
        let owned = tx
            .business(service.business_id)
            .await?
            .is_some_and(|business| business.owner_id == actor.id);
        if !owned {
            return Err(service_not_found());
        }

        let mut created = Vec::with_capacity(windows.len());
        for window in windows {
            if let Some(existing) = tx.find_overlapping_slot(service_id, window).await? {
                debug!(
                    service_id = %service_id,
                    existing_slot_id = %existing.id,
                    "Rejected overlapping slot"
                );
                return Err(BookingError::Conflict(
                    "Time slot overlaps with existing slot".to_string(),
                ));
            }
            created.push(tx.insert_slot(service_id, window).await?);
        }
        tx.commit().await?;

        info!(service_id = %service_id, count = created.len(), "Time slots created");
        Ok(created)
    }

    /// Deletes a free slot. Booked slots and slots with booking history stay.
    pub async fn delete_slot(&self, actor: &Actor, slot_id: Uuid) -> BookingResult<()> {
        require_role(actor, Role::Business)?;

        let mut tx = self.store.begin().await?;

        let slot = tx.lock_slot(slot_id).await?.ok_or_else(slot_not_found)?;
        let service = tx
            .service(slot.service_id)
            .await?
            .ok_or_else(slot_not_found)?;
        let owned = tx
            .business(service.business_id)
            .await?
            .is_some_and(|business| business.owner_id == actor.id);
        if !owned {
            return Err(slot_not_found());
        }

        if slot.is_booked {
            return Err(BookingError::SlotBooked);
        }
        if tx.slot_has_bookings(slot_id).await? {
            return Err(BookingError::Conflict(
                "Time slot has booking history".to_string(),
            ));
        }

        tx.delete_slot(slot_id).await?;
        tx.commit().await?;

        info!(timeslot_id = %slot_id, "Time slot deleted");
        Ok(())
    }

    /// Visible to the customer, the owning business and admins; everyone
    /// else gets `NotFound`.
    pub async fn get_booking(&self, actor: &Actor, booking_id: Uuid) -> BookingResult<BookingDetails> {
        self.store
            .booking_details(booking_id)
            .await?
            .filter(|details| details.visible_to(actor))
            .ok_or_else(booking_not_found)
    }

    pub async fn list_customer_bookings(
        &self,
        actor: &Actor,
        query: BookingListQuery,
    ) -> BookingResult<Vec<BookingDetails>> {
        self.store
            .list_bookings(BookingFilter {
                customer_id: Some(actor.id),
                status: query.status,
                ..BookingFilter::default()
            })
            .await
    }

    pub async fn list_business_bookings(
        &self,
        actor: &Actor,
        business_id: Uuid,
        query: BookingListQuery,
    ) -> BookingResult<Vec<BookingDetails>> {
        require_role(actor, Role::Business)?;

        let owned = self
            .store
            .business(business_id)
            .await?
            .is_some_and(|business| business.owner_id == actor.id);
        if !owned {
            return Err(BookingError::AccessDenied("Access denied".to_string()));
        }

        self.store
            .list_bookings(BookingFilter {
                business_id: Some(business_id),
                status: query.status,
                date: query.date,
                ..BookingFilter::default()
            })
            .await
    }

    /// Stores the external payment-intent reference on a pending payment.
    pub async fn attach_payment_reference(
        &self,
        actor: &Actor,
        request: AttachPaymentReferenceRequest,
    ) -> BookingResult<Payment> {
        let reference = request.reference.trim();
        if reference.is_empty() {
            return Err(BookingError::Validation(
                "Payment reference is required".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(request.booking_id)
            .await?
            .filter(|booking| booking.customer_id == actor.id)
            .ok_or_else(booking_not_found)?;
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::Conflict("Booking is cancelled".to_string()));
        }

        let payment = tx
            .payment_for_booking(booking.id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Payment not found".to_string()))?;
        if payment.status != PaymentStatus::Pending {
            return Err(BookingError::Conflict(format!(
                "Payment is already {}",
                payment.status
            )));
        }

        if let Some(existing) = tx.payment_by_reference(reference).await? {
            if existing.id != payment.id {
                return Err(BookingError::Conflict(
                    "Payment reference is already in use".to_string(),
                ));
            }
        }

        let updated = tx
            .set_payment_reference(payment.id, reference, request.payment_method.as_deref())
            .await?;
        tx.commit().await?;

        info!(booking_id = %booking.id, payment_id = %updated.id, "Payment reference attached");
        Ok(updated)
    }

    /// Applies a "payment succeeded" event. Replays of an applied event
    /// change nothing. The stored amount and currency are never taken from
    /// the event; an event that disagrees with them is a `Conflict`.
    pub async fn record_payment_succeeded(
        &self,
        event: PaymentSucceededEvent,
    ) -> BookingResult<PaymentEventOutcome> {
        let mut tx = self.store.begin().await?;

        let booking_id = tx
            .payment_by_reference(&event.reference)
            .await?
            .map(|payment| payment.booking_id)
            .ok_or_else(|| {
                BookingError::NotFound("No payment matches the reference".to_string())
            })?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(booking_not_found)?;
        let payment = tx
            .payment_for_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Payment not found".to_string()))?;

        if payment.status == PaymentStatus::Completed {
            debug!(booking_id = %booking_id, "Payment event already applied");
            return Ok(PaymentEventOutcome::AlreadyApplied);
        }
        if booking.status == BookingStatus::Cancelled {
            warn!(booking_id = %booking_id, "Payment succeeded for a cancelled booking");
            return Ok(PaymentEventOutcome::BookingCancelled);
        }

        let amount_differs = event
            .amount
            .is_some_and(|amount| amount != booking.total_price);
        let currency_differs = event
            .currency
            .as_deref()
            .is_some_and(|currency| !currency.eq_ignore_ascii_case(&payment.currency));
        if amount_differs || currency_differs {
            warn!(
                booking_id = %booking_id,
                expected_amount = %booking.total_price,
                expected_currency = %payment.currency,
                "Payment event does not match the booking price"
            );
            return Err(BookingError::Conflict(
                "Payment amount does not match the booking".to_string(),
            ));
        }

        tx.complete_payment(PaymentCompletion {
            booking_id,
            amount: booking.total_price,
            currency: payment.currency,
            payment_method: event.payment_method.or(payment.payment_method),
            payment_reference: event.reference,
            paid_at: Utc::now(),
        })
        .await?;

        if booking.status == BookingStatus::Booked {
            tx.set_booking_status(booking_id, BookingStatus::Confirmed)
                .await?;
        }

        let details = details_in(&mut *tx, booking_id).await?;
        tx.commit().await?;

        info!(booking_id = %booking_id, "Payment completed");
        self.notifications
            .enqueue(Notification::BookingConfirmed(details));

        Ok(PaymentEventOutcome::Applied)
    }
}

async fn details_in(tx: &mut dyn BookingTx, booking_id: Uuid) -> BookingResult<BookingDetails> {
    tx.booking_details(booking_id)
        .await?
        .ok_or_else(|| BookingError::Internal("booking row missing inside its transaction".into()))
}

fn require_role(actor: &Actor, role: Role) -> BookingResult<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(BookingError::AccessDenied(format!(
            "This operation requires the {role} role"
        )))
    }
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn booking_not_found() -> BookingError {
    BookingError::NotFound("Booking not found".to_string())
}

fn service_not_found() -> BookingError {
    BookingError::NotFound("Service not found".to_string())
}

fn slot_not_found() -> BookingError {
    BookingError::NotFound("Time slot not found".to_string())
}
