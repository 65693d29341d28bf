use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::discounts::{
        ApplyDiscountRequest, CreateDiscountRequest, DiscountApplication, DiscountList,
        UpdateDiscountRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Discount,
    response::ApiResponse,
    services::discount_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/apply", post(apply_discount))
        .route(
            "/{id}",
            get(get_discount).put(update_discount).delete(delete_discount),
        )
}

#[utoipa::path(
    get,
    path = "/api/discounts",
    responses(
        (status = 200, description = "Active discounts", body = ApiResponse<DiscountList>)
    ),
    tag = "Discounts"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DiscountList>>> {
    Ok(Json(discount_service::list_discounts(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/discounts/apply",
    request_body = ApplyDiscountRequest,
    responses(
        (status = 200, description = "Redemption outcome; invalid codes get a generic miss", body = ApiResponse<DiscountApplication>)
    ),
    tag = "Discounts"
)]
pub async fn apply_discount(
    State(state): State<AppState>,
    Json(payload): Json<ApplyDiscountRequest>,
) -> AppResult<Json<ApiResponse<DiscountApplication>>> {
    Ok(Json(discount_service::apply_discount(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/discounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID")
    ),
    responses(
        (status = 200, description = "Discount", body = ApiResponse<Discount>),
        (status = 404, description = "Discount not found"),
    ),
    tag = "Discounts"
)]
pub async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    Ok(Json(discount_service::get_discount(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/discounts",
    request_body = CreateDiscountRequest,
    responses(
        (status = 200, description = "Discount created", body = ApiResponse<Discount>),
        (status = 400, description = "Bad percentage, window or cap"),
        (status = 409, description = "Code already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    Ok(Json(
        discount_service::create_discount(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/discounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID")
    ),
    request_body = UpdateDiscountRequest,
    responses(
        (status = 200, description = "Discount updated", body = ApiResponse<Discount>),
        (status = 400, description = "Cap below redeemed count"),
        (status = 404, description = "Discount not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    Ok(Json(
        discount_service::update_discount(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/discounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Discount ID")
    ),
    responses(
        (status = 200, description = "Discount deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Discount not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        discount_service::delete_discount(&state, &user, id).await?,
    ))
}
