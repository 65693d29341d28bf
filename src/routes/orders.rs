use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems},
    dto::shipping::CreateShippingDetailsRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::ShippingDetails,
    response::ApiResponse,
    services::{order_service, shipping_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
        .route(
            "/{id}/shipping",
            get(get_shipping_details).post(create_shipping_details),
        )
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Current user's orders, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::list_orders(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created from the cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(
        order_service::create_order(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(order_service::get_order(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/shipping",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Shipping details", body = ApiResponse<ShippingDetails>),
        (status = 404, description = "Order or shipping details not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_shipping_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShippingDetails>>> {
    Ok(Json(
        shipping_service::get_shipping_details(&state.pool, &user, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/shipping",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = CreateShippingDetailsRequest,
    responses(
        (status = 200, description = "Shipping details created", body = ApiResponse<ShippingDetails>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Shipping details already exist"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_shipping_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateShippingDetailsRequest>,
) -> AppResult<Json<ApiResponse<ShippingDetails>>> {
    Ok(Json(
        shipping_service::create_shipping_details(&state.pool, &user, id, payload).await?,
    ))
}
