use crate::models::{DbBusiness, DbService, DbUser};
use eyre::Result;
use slotbook_core::rating::RatingSummary;
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

pub async fn get_user_by_id<'e, E>(executor: E, user_id: Uuid) -> Result<Option<DbUser>>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, email, role
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

pub async fn get_business_by_id<'e, E>(executor: E, business_id: Uuid) -> Result<Option<DbBusiness>>
where
    E: PgExecutor<'e>,
{
    let business = sqlx::query_as::<_, DbBusiness>(
        r#"
        SELECT id, user_id, name, is_approved, rating, total_reviews, updated_at
        FROM businesses
        WHERE id = $1
        "#,
    )
    .bind(business_id)
    .fetch_optional(executor)
    .await?;

    Ok(business)
}

pub async fn lock_business<'e, E>(executor: E, business_id: Uuid) -> Result<Option<DbBusiness>>
where
    E: PgExecutor<'e>,
{
    let business = sqlx::query_as::<_, DbBusiness>(
        r#"
        SELECT id, user_id, name, is_approved, rating, total_reviews, updated_at
        FROM businesses
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(business_id)
    .fetch_optional(executor)
    .await?;

    Ok(business)
}

pub async fn update_business_rating<'e, E>(
    executor: E,
    business_id: Uuid,
    summary: RatingSummary,
) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE businesses
        SET rating = $2, total_reviews = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(business_id)
    .bind(summary.rating)
    .bind(summary.total_reviews)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_service_by_id<'e, E>(executor: E, service_id: Uuid) -> Result<Option<DbService>>
where
    E: PgExecutor<'e>,
{
    let service = sqlx::query_as::<_, DbService>(
        r#"
        SELECT id, business_id, service_name, price, duration, is_active
        FROM services
        WHERE id = $1
        "#,
    )
    .bind(service_id)
    .fetch_optional(executor)
    .await?;

    Ok(service)
}

pub async fn lock_service<'e, E>(executor: E, service_id: Uuid) -> Result<Option<DbService>>
where
    E: PgExecutor<'e>,
{
    let service = sqlx::query_as::<_, DbService>(
        r#"
        SELECT id, business_id, service_name, price, duration, is_active
        FROM services
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(service_id)
    .fetch_optional(executor)
    .await?;

    Ok(service)
}
