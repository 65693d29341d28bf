use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::contact::{ContactMessageList, CreateContactMessageRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ContactMessage,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_message).get(list_messages))
        .route("/unread", get(list_unread))
        .route("/{id}/read", put(mark_read))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = CreateContactMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Missing name, email or message"),
    ),
    tag = "Contact"
)]
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactMessageRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    Ok(Json(contact_service::create_message(&state.pool, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    responses(
        (status = 200, description = "All contact messages", body = ApiResponse<ContactMessageList>),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactMessageList>>> {
    Ok(Json(contact_service::list_messages(&state.pool, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/contact/unread",
    responses(
        (status = 200, description = "Unread contact messages", body = ApiResponse<ContactMessageList>),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn list_unread(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactMessageList>>> {
    Ok(Json(contact_service::list_unread(&state.pool, &user).await?))
}

#[utoipa::path(
    put,
    path = "/api/contact/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Marked read", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Message not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(contact_service::mark_read(&state.pool, &user, id).await?))
}
