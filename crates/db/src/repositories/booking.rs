use crate::models::{DbBooking, DbBookingDetails};
use chrono::Utc;
use eyre::Result;
use slotbook_core::models::booking::{BookingFilter, BookingStatus, NewBooking};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.status, b.customer_notes, b.total_price, b.created_at,
           u.id AS customer_id, u.name AS customer_name, u.email AS customer_email,
           bz.id AS business_id, bz.name AS business_name, bz.user_id AS business_owner_id,
           s.id AS service_id, s.service_name,
           t.id AS timeslot_id, t.start_time, t.end_time,
           p.status AS payment_status
    FROM bookings b
    JOIN users u ON u.id = b.customer_id
    JOIN businesses bz ON bz.id = b.business_id
    JOIN services s ON s.id = b.service_id
    JOIN time_slots t ON t.id = b.timeslot_id
    LEFT JOIN payments p ON p.booking_id = b.id
"#;

pub async fn create_booking<'e, E>(executor: E, booking: NewBooking) -> Result<DbBooking>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        INSERT INTO bookings (
            id, customer_id, business_id, service_id, timeslot_id,
            status, customer_notes, total_price, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING id, customer_id, business_id, service_id, timeslot_id,
                  status, customer_notes, total_price, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(booking.customer_id)
    .bind(booking.business_id)
    .bind(booking.service_id)
    .bind(booking.timeslot_id)
    .bind(BookingStatus::Booked.as_str())
    .bind(booking.customer_notes)
    .bind(booking.total_price)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(booking)
}

pub async fn lock_booking<'e, E>(executor: E, booking_id: Uuid) -> Result<Option<DbBooking>>
where
    E: PgExecutor<'e>,
{
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, customer_id, business_id, service_id, timeslot_id,
               status, customer_notes, total_price, created_at, updated_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(executor)
    .await?;

    Ok(booking)
}

pub async fn update_booking_status<'e, E>(
    executor: E,
    booking_id: Uuid,
    status: BookingStatus,
) -> Result<DbBooking>
where
    E: PgExecutor<'e>,
{
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, customer_id, business_id, service_id, timeslot_id,
                  status, customer_notes, total_price, created_at, updated_at
        "#,
    )
    .bind(booking_id)
    .bind(status.as_str())
    .fetch_one(executor)
    .await?;

    Ok(booking)
}

pub async fn get_booking_details<'e, E>(
    executor: E,
    booking_id: Uuid,
) -> Result<Option<DbBookingDetails>>
where
    E: PgExecutor<'e>,
{
    let details = sqlx::query_as::<_, DbBookingDetails>(&format!(
        "{DETAILS_SELECT} WHERE b.id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(executor)
    .await?;

    Ok(details)
}

pub async fn list_booking_details<'e, E>(
    executor: E,
    filter: BookingFilter,
) -> Result<Vec<DbBookingDetails>>
where
    E: PgExecutor<'e>,
{
    let bookings = sqlx::query_as::<_, DbBookingDetails>(&format!(
        r#"
        {DETAILS_SELECT}
        WHERE ($1::uuid IS NULL OR b.customer_id = $1)
          AND ($2::uuid IS NULL OR b.business_id = $2)
          AND ($3::text IS NULL OR b.status = $3)
          AND ($4::date IS NULL OR (t.start_time AT TIME ZONE 'UTC')::date = $4)
        ORDER BY t.start_time DESC
        "#
    ))
    .bind(filter.customer_id)
    .bind(filter.business_id)
    .bind(filter.status.map(|status| status.as_str()))
    .bind(filter.date)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}
