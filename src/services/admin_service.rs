use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::orders::OrderSummary,
    entity::{
        categories::Entity as Categories,
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
        users::Entity as Users,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    response::ApiResponse,
    services::order_service::order_from_entity,
    state::AppState,
};

const RECENT_ORDER_COUNT: u64 = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_categories: u64,
    pub total_orders: u64,
    pub total_users: u64,
    pub recent_orders: Vec<OrderSummary>,
}

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_staff(user)?;

    let total_products = Products::find().count(&state.orm).await?;
    let total_categories = Categories::find().count(&state.orm).await?;
    let total_orders = Orders::find().count(&state.orm).await?;
    let total_users = Users::find().count(&state.orm).await?;

    let recent_orders = Orders::find()
        .find_also_related(Users)
        .order_by_desc(OrderCol::OrderDate)
        .limit(RECENT_ORDER_COUNT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, owner)| OrderSummary {
            order: order_from_entity(order),
            user_email: owner.map(|u| u.email),
        })
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            total_products,
            total_categories,
            total_orders,
            total_users,
            recent_orders,
        },
        None,
    ))
}
