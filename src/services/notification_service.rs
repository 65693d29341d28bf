use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::notifications::{MarkReadRequest, NotificationList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
};

pub async fn list_notifications(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<NotificationList>> {
    let items = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        None,
    ))
}

pub async fn list_unread(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<NotificationList>> {
    let items = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = $1 AND NOT is_read ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Unread notifications",
        NotificationList { items },
        None,
    ))
}

pub async fn mark_read(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: MarkReadRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("UPDATE notifications SET is_read = $3 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .bind(payload.is_read)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn delete_notification(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
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
