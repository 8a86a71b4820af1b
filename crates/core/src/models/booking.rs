use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::payment::{Payment, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Confirmed,
    Completed,
    Cancelled,
    #[serde(rename = "no-show")]
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Whether the booking still claims its time slot.
    pub fn holds_slot(&self) -> bool {
        *self != BookingStatus::Cancelled
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(BookingStatus::Booked),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no-show" => Ok(BookingStatus::NoShow),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub timeslot_id: Uuid,
    pub status: BookingStatus,
    pub customer_notes: Option<String>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a booking row; status always starts as `booked`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub timeslot_id: Uuid,
    pub customer_notes: Option<String>,
    pub total_price: Decimal,
}

/// Denormalized view joining a booking with its customer, business,
/// service, slot and payment. Used for responses and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub id: Uuid,
    pub status: BookingStatus,
    pub customer_notes: Option<String>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub business_id: Uuid,
    pub business_name: String,
    pub business_owner_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub timeslot_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub payment_status: Option<PaymentStatus>,
}

impl BookingDetails {
    pub fn visible_to(&self, actor: &super::actor::Actor) -> bool {
        actor.is_admin() || actor.id == self.customer_id || actor.id == self.business_owner_id
    }
}

/// Store-level selection for booking listings.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub customer_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

/// Everything produced by a successful booking transaction.
#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub payment: Payment,
    pub details: BookingDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub timeslot_id: Uuid,
    pub customer_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub message: String,
    pub booking: BookingDetails,
    pub payment: Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBookingResponse {
    pub booking: BookingDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

/// Returned by the cancel and complete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingUpdateResponse {
    pub message: String,
    pub booking: Booking,
}
