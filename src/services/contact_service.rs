use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::contact::{ContactMessageList, CreateContactMessageRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::ContactMessage,
    response::{ApiResponse, Meta},
};

pub async fn create_message(
    pool: &DbPool,
    payload: CreateContactMessageRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "name, email and message are required".into(),
        ));
    }

    let message: ContactMessage = sqlx::query_as(
        "INSERT INTO contact_messages (id, name, email, message) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(payload.message)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success(
        "Message sent",
        message,
        Some(Meta::empty()),
    ))
}

pub async fn list_messages(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<ContactMessageList>> {
    ensure_staff(user)?;

    let items = sqlx::query_as::<_, ContactMessage>(
        "SELECT * FROM contact_messages ORDER BY sent_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Messages",
        ContactMessageList { items },
        None,
    ))
}

pub async fn list_unread(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<ContactMessageList>> {
    ensure_staff(user)?;

    let items = sqlx::query_as::<_, ContactMessage>(
        "SELECT * FROM contact_messages WHERE NOT is_read ORDER BY sent_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Unread messages",
        ContactMessageList { items },
        None,
    ))
}

pub async fn mark_read(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let result = sqlx::query("UPDATE contact_messages SET is_read = TRUE WHERE id = $1")
        .bind(id)
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
