use crate::models::DbTimeSlot;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use eyre::Result;
use slotbook_core::models::time_slot::{SlotFilter, TimeWindow};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

const SLOT_COLUMNS: &str =
    "id, service_id, start_time, end_time, is_booked, created_at, updated_at";

pub async fn create_time_slot<'e, E>(
    executor: E,
    service_id: Uuid,
    window: TimeWindow,
) -> Result<DbTimeSlot>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        INSERT INTO time_slots (id, service_id, start_time, end_time, is_booked, created_at, updated_at)
        VALUES ($1, $2, $3, $4, FALSE, $5, $5)
        RETURNING id, service_id, start_time, end_time, is_booked, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(service_id)
    .bind(window.start)
    .bind(window.end)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(time_slot)
}

/// Flips `is_booked` from false to true in a single conditional update.
/// Of several concurrent callers exactly one gets the row back.
pub async fn claim_time_slot<'e, E>(
    executor: E,
    slot_id: Uuid,
    service_id: Uuid,
) -> Result<Option<DbTimeSlot>>
where
    E: PgExecutor<'e>,
{
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        UPDATE time_slots
        SET is_booked = TRUE, updated_at = NOW()
        WHERE id = $1 AND service_id = $2 AND is_booked = FALSE
        RETURNING id, service_id, start_time, end_time, is_booked, created_at, updated_at
        "#,
    )
    .bind(slot_id)
    .bind(service_id)
    .fetch_optional(executor)
    .await?;

    Ok(time_slot)
}

pub async fn release_time_slot<'e, E>(executor: E, slot_id: Uuid) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE time_slots
        SET is_booked = FALSE, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(slot_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn lock_time_slot<'e, E>(executor: E, slot_id: Uuid) -> Result<Option<DbTimeSlot>>
where
    E: PgExecutor<'e>,
{
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM time_slots WHERE id = $1 FOR UPDATE"
    ))
    .bind(slot_id)
    .fetch_optional(executor)
    .await?;

    Ok(time_slot)
}

pub async fn find_overlapping_time_slot<'e, E>(
    executor: E,
    service_id: Uuid,
    window: TimeWindow,
) -> Result<Option<DbTimeSlot>>
where
    E: PgExecutor<'e>,
{
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM time_slots
        WHERE service_id = $1
          AND (
            (start_time <= $2 AND end_time > $2)
            OR (start_time < $3 AND end_time >= $3)
            OR (start_time >= $2 AND end_time <= $3)
          )
        ORDER BY start_time ASC
        LIMIT 1
        "#
    ))
    .bind(service_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_optional(executor)
    .await?;

    Ok(time_slot)
}

pub async fn get_free_time_slots<'e, E>(
    executor: E,
    service_id: Uuid,
    filter: SlotFilter,
    now: DateTime<Utc>,
) -> Result<Vec<DbTimeSlot>>
where
    E: PgExecutor<'e>,
{
    let time_slots = match filter {
        SlotFilter::Upcoming => {
            sqlx::query_as::<_, DbTimeSlot>(&format!(
                r#"
                SELECT {SLOT_COLUMNS}
                FROM time_slots
                WHERE service_id = $1 AND is_booked = FALSE AND start_time > $2
                ORDER BY start_time ASC
                "#
            ))
            .bind(service_id)
            .bind(now)
            .fetch_all(executor)
            .await?
        }
        SlotFilter::On(date) | SlotFilter::Between(date, _) => {
            let last = match filter {
                SlotFilter::Between(_, to) => to,
                _ => date,
            };
            sqlx::query_as::<_, DbTimeSlot>(&format!(
                r#"
                SELECT {SLOT_COLUMNS}
                FROM time_slots
                WHERE service_id = $1 AND is_booked = FALSE
                  AND start_time >= $2 AND start_time < $3
                ORDER BY start_time ASC
                "#
            ))
            .bind(service_id)
            .bind(start_of_day(date))
            .bind(start_of_day(last) + Duration::days(1))
            .fetch_all(executor)
            .await?
        }
    };

    Ok(time_slots)
}

pub async fn time_slot_has_bookings<'e, E>(executor: E, slot_id: Uuid) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM bookings WHERE timeslot_id = $1)
        "#,
    )
    .bind(slot_id)
    .fetch_one(executor)
    .await?;

    Ok(exists)
}

pub async fn delete_time_slot<'e, E>(executor: E, slot_id: Uuid) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        DELETE FROM time_slots
        WHERE id = $1
        "#,
    )
    .bind(slot_id)
    .execute(executor)
    .await?;

    Ok(())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
