use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::discounts::{
        ApplyDiscountRequest, CreateDiscountRequest, DiscountApplication, DiscountList,
        UpdateDiscountRequest,
    },
    entity::discounts::{ActiveModel as DiscountActive, Column, Entity as Discounts, Model},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Discount,
    response::{ApiResponse, Meta},
    state::AppState,
};

const INVALID_CODE_MESSAGE: &str = "Invalid or expired discount code";

/// Atomically redeem `code`: the usage counter is bumped in the same
/// statement that checks the activity window and cap, so concurrent
/// redemptions can never push `current_uses` past `max_uses`.
///
/// Returns `None` on any miss without saying why.
pub async fn redeem<C: ConnectionTrait>(conn: &C, code: &str) -> AppResult<Option<Model>> {
    let now = Utc::now();
    let updated = Discounts::update_many()
        .col_expr(Column::CurrentUses, Expr::col(Column::CurrentUses).add(1))
        .filter(
            Condition::all()
                .add(Column::Code.eq(code))
                .add(Column::IsActive.eq(true))
                .add(Column::StartsAt.lte(now))
                .add(Column::EndsAt.gt(now))
                .add(
                    Condition::any()
                        .add(Column::MaxUses.is_null())
                        .add(Expr::col(Column::CurrentUses).lt(Expr::col(Column::MaxUses))),
                ),
        )
        .exec_with_returning(conn)
        .await?;

    Ok(updated.into_iter().next())
}

pub async fn apply_discount(
    state: &AppState,
    payload: ApplyDiscountRequest,
) -> AppResult<ApiResponse<DiscountApplication>> {
    let application = match redeem(&state.orm, payload.code.trim()).await? {
        Some(discount) => DiscountApplication {
            valid: true,
            message: "Discount applied successfully".into(),
            percentage: Some(discount.percentage),
        },
        None => DiscountApplication {
            valid: false,
            message: INVALID_CODE_MESSAGE.into(),
            percentage: None,
        },
    };

    Ok(ApiResponse::success("OK", application, None))
}

pub async fn list_discounts(state: &AppState) -> AppResult<ApiResponse<DiscountList>> {
    let items = Discounts::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(discount_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Discounts",
        DiscountList { items },
        None,
    ))
}

pub async fn get_discount(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Discount>> {
    let discount = Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(discount_from_entity);
    let discount = match discount {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Discount", discount, None))
}

pub async fn create_discount(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_staff(user)?;

    if !(1..=100).contains(&payload.percentage) {
        return Err(AppError::BadRequest(
            "percentage must be between 1 and 100".into(),
        ));
    }
    if payload.ends_at <= payload.starts_at {
        return Err(AppError::BadRequest(
            "ends_at must be after starts_at".into(),
        ));
    }
    if payload.max_uses.is_some_and(|cap| cap <= 0) {
        return Err(AppError::BadRequest(
            "max_uses must be greater than 0".into(),
        ));
    }

    let active = DiscountActive {
        id: Set(Uuid::new_v4()),
        code: Set(payload.code.trim().to_string()),
        description: Set(payload.description),
        percentage: Set(payload.percentage),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        max_uses: Set(payload.max_uses),
        current_uses: Set(0),
        is_active: Set(true),
        category_id: Set(payload.category_id),
        product_id: Set(payload.product_id),
    };
    let discount = active.insert(&state.orm).await.map_err(|err| {
        if err.to_string().contains("duplicate key") {
            AppError::Conflict("discount code already exists".into())
        } else {
            AppError::OrmError(err)
        }
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_create",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": discount.id, "code": discount.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Discount created",
        discount_from_entity(discount),
        Some(Meta::empty()),
    ))
}

pub async fn update_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_staff(user)?;

    let existing = Discounts::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };

    if payload
        .max_uses
        .is_some_and(|cap| cap < existing.current_uses)
    {
        return Err(AppError::BadRequest(
            "max_uses cannot be below recorded uses".into(),
        ));
    }

    let mut active: DiscountActive = existing.into();
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(ends_at) = payload.ends_at {
        active.ends_at = Set(ends_at.into());
    }
    if let Some(max_uses) = payload.max_uses {
        active.max_uses = Set(Some(max_uses));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let discount = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_update",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": discount.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Discount updated",
        discount_from_entity(discount),
        Some(Meta::empty()),
    ))
}

pub async fn delete_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let result = Discounts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "discount_delete",
        Some("discounts"),
        Some(serde_json::json!({ "discount_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn discount_from_entity(model: Model) -> Discount {
    Discount {
        id: model.id,
        code: model.code,
        description: model.description,
        percentage: model.percentage,
        starts_at: model.starts_at.with_timezone(&Utc),
        ends_at: model.ends_at.with_timezone(&Utc),
        max_uses: model.max_uses,
        current_uses: model.current_uses,
        is_active: model.is_active,
        category_id: model.category_id,
        product_id: model.product_id,
    }
}
