use crate::models::DbPayment;
use chrono::Utc;
use eyre::Result;
use slotbook_core::models::payment::{NewPayment, PaymentCompletion, PaymentStatus};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

pub async fn create_payment<'e, E>(executor: E, payment: NewPayment) -> Result<DbPayment>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let payment = sqlx::query_as::<_, DbPayment>(
        r#"
        INSERT INTO payments (id, booking_id, amount, currency, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id, booking_id, amount, currency, status, payment_method,
                  payment_reference, paid_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(payment.booking_id)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(PaymentStatus::Pending.as_str())
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(payment)
}

pub async fn get_payment_by_booking_id<'e, E>(
    executor: E,
    booking_id: Uuid,
) -> Result<Option<DbPayment>>
where
    E: PgExecutor<'e>,
{
    let payment = sqlx::query_as::<_, DbPayment>(
        r#"
        SELECT id, booking_id, amount, currency, status, payment_method,
               payment_reference, paid_at, created_at, updated_at
        FROM payments
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(executor)
    .await?;

    Ok(payment)
}

pub async fn get_payment_by_reference<'e, E>(
    executor: E,
    reference: &str,
) -> Result<Option<DbPayment>>
where
    E: PgExecutor<'e>,
{
    let payment = sqlx::query_as::<_, DbPayment>(
        r#"
        SELECT id, booking_id, amount, currency, status, payment_method,
               payment_reference, paid_at, created_at, updated_at
        FROM payments
        WHERE payment_reference = $1
        "#,
    )
    .bind(reference)
    .fetch_optional(executor)
    .await?;

    Ok(payment)
}

pub async fn set_payment_reference<'e, E>(
    executor: E,
    payment_id: Uuid,
    reference: &str,
    payment_method: Option<&str>,
) -> Result<DbPayment>
where
    E: PgExecutor<'e>,
{
    let payment = sqlx::query_as::<_, DbPayment>(
        r#"
        UPDATE payments
        SET payment_reference = $2,
            payment_method = COALESCE($3, payment_method),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, booking_id, amount, currency, status, payment_method,
                  payment_reference, paid_at, created_at, updated_at
        "#,
    )
    .bind(payment_id)
    .bind(reference)
    .bind(payment_method)
    .fetch_one(executor)
    .await?;

    Ok(payment)
}

pub async fn refund_payment<'e, E>(executor: E, booking_id: Uuid) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE payments
        SET status = $2, updated_at = NOW()
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .bind(PaymentStatus::Refunded.as_str())
    .execute(executor)
    .await?;

    Ok(())
}

/// Upsert keyed by booking. An existing row keeps its amount and currency.
pub async fn complete_payment<'e, E>(executor: E, completion: PaymentCompletion) -> Result<DbPayment>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();

    let payment = sqlx::query_as::<_, DbPayment>(
        r#"
        INSERT INTO payments (
            id, booking_id, amount, currency, status, payment_method,
            payment_reference, paid_at, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
        ON CONFLICT (booking_id) DO UPDATE
        SET status = EXCLUDED.status,
            payment_method = EXCLUDED.payment_method,
            payment_reference = EXCLUDED.payment_reference,
            paid_at = EXCLUDED.paid_at,
            updated_at = NOW()
        RETURNING id, booking_id, amount, currency, status, payment_method,
                  payment_reference, paid_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(completion.booking_id)
    .bind(completion.amount)
    .bind(completion.currency)
    .bind(PaymentStatus::Completed.as_str())
    .bind(completion.payment_method)
    .bind(completion.payment_reference)
    .bind(completion.paid_at)
    .fetch_one(executor)
    .await?;

    Ok(payment)
}
