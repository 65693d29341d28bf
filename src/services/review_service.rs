use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::reviews::{CreateReviewRequest, ReviewDto, ReviewList, UpdateReviewRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    author: String,
    product_id: Uuid,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

const REVIEW_COLUMNS: &str = r#"
    SELECT r.id, r.user_id, u.email AS author, r.product_id,
           r.rating, r.comment, r.created_at, r.updated_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
"#;

pub async fn list_product_reviews(
    pool: &DbPool,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
        "{REVIEW_COLUMNS} WHERE r.product_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    let items = rows.into_iter().map(review_dto).collect();
    Ok(ApiResponse::success("Reviews", ReviewList { items }, None))
}

pub async fn create_review(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<ReviewDto>> {
    validate_rating(payload.rating)?;

    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::NotFound);
    }

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO reviews (id, user_id, product_id, rating, comment) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.rating)
    .bind(payload.comment)
    .execute(pool)
    .await?;

    let row: ReviewRow = sqlx::query_as(&format!("{REVIEW_COLUMNS} WHERE r.id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "Review created",
        review_dto(row),
        Some(Meta::empty()),
    ))
}

pub async fn update_review(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<ReviewDto>> {
    validate_rating(payload.rating)?;

    let result = sqlx::query(
        r#"
        UPDATE reviews
        SET rating = $3, comment = $4, updated_at = now()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(payload.comment)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    let row: ReviewRow = sqlx::query_as(&format!("{REVIEW_COLUMNS} WHERE r.id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "Review updated",
        review_dto(row),
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_rating(rating: i32) -> Result<(), AppError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::BadRequest("rating must be between 1 and 5".into()))
    }
}

fn review_dto(row: ReviewRow) -> ReviewDto {
    // Reviews display the part of the email before the @, not the address.
    let author = row
        .author
        .split('@')
        .next()
        .unwrap_or(row.author.as_str())
        .to_owned();
    ReviewDto {
        id: row.id,
        user_id: row.user_id,
        author,
        product_id: row.product_id,
        rating: row.rating,
        comment: row.comment,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
