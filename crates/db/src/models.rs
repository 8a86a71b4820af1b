use chrono::{DateTime, Utc};
use eyre::{eyre, Report};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use slotbook_core::models::{
    booking::{Booking, BookingDetails},
    business::{Business, Service, User},
    payment::Payment,
    review::Review,
    time_slot::TimeSlot,
};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBusiness {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub is_approved: bool,
    pub rating: Decimal,
    pub total_reviews: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbService {
    pub id: Uuid,
    pub business_id: Uuid,
    pub service_name: String,
    pub price: Decimal,
    pub duration: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeSlot {
    pub id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub timeslot_id: Uuid,
    pub status: String,
    pub customer_notes: Option<String>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking joined with customer, business, service, slot and payment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingDetails {
    pub id: Uuid,
    pub status: String,
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
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReview {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = Report;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse().map_err(|e: String| eyre!(e))?,
        })
    }
}

impl From<DbBusiness> for Business {
    fn from(row: DbBusiness) -> Self {
        Business {
            id: row.id,
            owner_id: row.user_id,
            name: row.name,
            is_approved: row.is_approved,
            rating: row.rating,
            total_reviews: row.total_reviews,
            updated_at: row.updated_at,
        }
    }
}

impl From<DbService> for Service {
    fn from(row: DbService) -> Self {
        Service {
            id: row.id,
            business_id: row.business_id,
            name: row.service_name,
            price: row.price,
            duration_minutes: row.duration,
            is_active: row.is_active,
        }
    }
}

impl From<DbTimeSlot> for TimeSlot {
    fn from(row: DbTimeSlot) -> Self {
        TimeSlot {
            id: row.id,
            service_id: row.service_id,
            start_time: row.start_time,
            end_time: row.end_time,
            is_booked: row.is_booked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<DbBooking> for Booking {
    type Error = Report;

    fn try_from(row: DbBooking) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            customer_id: row.customer_id,
            business_id: row.business_id,
            service_id: row.service_id,
            timeslot_id: row.timeslot_id,
            status: row.status.parse().map_err(|e: String| eyre!(e))?,
            customer_notes: row.customer_notes,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbBookingDetails> for BookingDetails {
    type Error = Report;

    fn try_from(row: DbBookingDetails) -> Result<Self, Self::Error> {
        let payment_status = row
            .payment_status
            .map(|status| status.parse().map_err(|e: String| eyre!(e)))
            .transpose()?;

        Ok(BookingDetails {
            id: row.id,
            status: row.status.parse().map_err(|e: String| eyre!(e))?,
            customer_notes: row.customer_notes,
            total_price: row.total_price,
            created_at: row.created_at,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            business_id: row.business_id,
            business_name: row.business_name,
            business_owner_id: row.business_owner_id,
            service_id: row.service_id,
            service_name: row.service_name,
            timeslot_id: row.timeslot_id,
            start_time: row.start_time,
            end_time: row.end_time,
            payment_status,
        })
    }
}

impl TryFrom<DbPayment> for Payment {
    type Error = Report;

    fn try_from(row: DbPayment) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            currency: row.currency,
            status: row.status.parse().map_err(|e: String| eyre!(e))?,
            payment_method: row.payment_method,
            payment_reference: row.payment_reference,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<DbReview> for Review {
    fn from(row: DbReview) -> Self {
        Review {
            id: row.id,
            booking_id: row.booking_id,
            business_id: row.business_id,
            customer_id: row.customer_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}
