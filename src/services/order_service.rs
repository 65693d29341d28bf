use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        AdminOrderList, CreateOrderRequest, OrderList, OrderSummary, OrderWithItems,
        UpdateOrderStatusRequest,
    },
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::Column as CartCol,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Column as ProdCol,
        shipping_details::{
            ActiveModel as ShippingActive, Column as ShippingCol, Entity as ShippingDetails,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    services::discount_service,
    state::AppState,
};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SHIPPED: &str = "shipped";

const VALID_STATUSES: [&str; 5] = ["pending", "processing", "shipped", "delivered", "cancelled"];

const ESTIMATED_DELIVERY_DAYS: i64 = 3;

/// Convert the caller's cart into an order inside one transaction: price
/// snapshot, at most one discount redemption, cart cleared. Any failure
/// rolls the whole thing back and leaves the cart as it was.
///
/// Stock is checked at cart-mutation time only and is NOT decremented here.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    #[derive(Debug, FromQueryResult)]
    struct CartProductRow {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: i64,
    }

    let rows = CartItems::find()
        .select_only()
        .column_as(CartItemCol::CartId, "cart_id")
        .column_as(CartItemCol::ProductId, "product_id")
        .column_as(CartItemCol::Quantity, "quantity")
        .column_as(ProdCol::Price, "price")
        .join(JoinType::InnerJoin, cart_items::Relation::Carts.def())
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .into_model::<CartProductRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let subtotal: i64 = rows
        .iter()
        .map(|row| row.price * row.quantity as i64)
        .sum();

    // An invalid code is ignored rather than failing the order; a valid one
    // is redeemed inside this transaction so a rollback undoes the counter.
    let mut discount_amount: i64 = 0;
    if let Some(code) = payload.discount_code.as_deref().filter(|c| !c.is_empty()) {
        if let Some(discount) = discount_service::redeem(&txn, code).await? {
            discount_amount = subtotal * discount.percentage as i64 / 100;
        }
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_date: Set(Utc::now().into()),
        total_amount: Set(subtotal - discount_amount),
        status: Set(STATUS_PENDING.into()),
        shipping_address: Set(payload.shipping_address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for row in &rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            unit_price: Set(row.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));
    }

    // Clear the cart lines; the cart row itself stays around, empty.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(rows[0].cart_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let items = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::OrderDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    Ok(ApiResponse::success("Orders", OrderList { items }, None))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_staff(user)?;

    let items = Orders::find()
        .find_also_related(crate::entity::Users)
        .order_by_desc(OrderCol::OrderDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, owner)| OrderSummary {
            order: order_from_entity(order),
            user_email: owner.map(|u| u.email),
        })
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        AdminOrderList { items },
        None,
    ))
}

/// Unconditional status overwrite, staff only. Becoming `shipped` with a
/// tracking number stamps the shipping record with dispatch and estimated
/// delivery dates.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    validate_order_status(&payload.status)?;

    let txn = state.orm.begin().await?;

    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status.clone());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    if payload.status == STATUS_SHIPPED {
        if let Some(tracking) = payload
            .tracking_number
            .as_deref()
            .filter(|t| !t.is_empty())
        {
            let shipping = ShippingDetails::find()
                .filter(ShippingCol::OrderId.eq(order.id))
                .one(&txn)
                .await?;
            if let Some(shipping) = shipping {
                let now = Utc::now();
                let mut active: ShippingActive = shipping.into();
                active.tracking_number = Set(Some(tracking.to_string()));
                active.shipped_date = Set(Some(now.into()));
                active.estimated_delivery_date =
                    Set(Some((now + Duration::days(ESTIMATED_DELIVERY_DAYS)).into()));
                active.update(&txn).await?;
            }
        }
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        order_date: model.order_date.with_timezone(&Utc),
        total_amount: model.total_amount,
        status: model.status,
        shipping_address: model.shipping_address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
