use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::favorites::{AddFavoriteRequest, FavoriteDto, FavoriteList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct FavoriteRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    product_price: i64,
    product_image: Option<String>,
}

pub async fn list_favorites(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<FavoriteList>> {
    let rows: Vec<FavoriteRow> = sqlx::query_as(
        r#"
        SELECT f.id, f.product_id, p.name AS product_name, p.price AS product_price,
               (SELECT pi.image_path FROM product_images pi
                WHERE pi.product_id = p.id AND pi.is_main LIMIT 1) AS product_image
        FROM favorites f
        JOIN products p ON p.id = f.product_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| FavoriteDto {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_price: row.product_price,
            product_image: row.product_image,
        })
        .collect();

    Ok(ApiResponse::success("OK", FavoriteList { items }, None))
}

/// Favoriting an already-favorited or missing product is reported as a
/// failure without changing anything.
pub async fn add_favorite(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::BadRequest(
            "Product already in favorites or not found".into(),
        ));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO favorites (id, user_id, product_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .execute(pool)
    .await?;

    if inserted.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "Product already in favorites or not found".into(),
        ));
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "favorite_add",
        Some("favorites"),
        Some(serde_json::json!({ "product_id": payload.product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "favorite_remove",
        Some("favorites"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
