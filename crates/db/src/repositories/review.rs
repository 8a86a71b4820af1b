use crate::models::DbReview;
use chrono::Utc;
use eyre::Result;
use slotbook_core::models::review::NewReview;
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

pub async fn create_review<'e, E>(executor: E, review: NewReview) -> Result<DbReview>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let review = sqlx::query_as::<_, DbReview>(
        r#"
        INSERT INTO reviews (id, booking_id, business_id, customer_id, rating, comment, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, booking_id, business_id, customer_id, rating, comment, created_at
        "#,
    )
    .bind(id)
    .bind(review.booking_id)
    .bind(review.business_id)
    .bind(review.customer_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(review)
}

pub async fn get_review_by_booking_id<'e, E>(
    executor: E,
    booking_id: Uuid,
) -> Result<Option<DbReview>>
where
    E: PgExecutor<'e>,
{
    let review = sqlx::query_as::<_, DbReview>(
        r#"
        SELECT id, booking_id, business_id, customer_id, rating, comment, created_at
        FROM reviews
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(executor)
    .await?;

    Ok(review)
}

pub async fn get_ratings_by_business_id<'e, E>(executor: E, business_id: Uuid) -> Result<Vec<i32>>
where
    E: PgExecutor<'e>,
{
    let ratings = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT rating
        FROM reviews
        WHERE business_id = $1
        "#,
    )
    .bind(business_id)
    .fetch_all(executor)
    .await?;

    Ok(ratings)
}
