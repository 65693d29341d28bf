use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::shipping::CreateShippingDetailsRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::ShippingDetails,
    response::{ApiResponse, Meta},
};

pub async fn get_shipping_details(
    pool: &DbPool,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<ShippingDetails>> {
    // Ownership is part of the lookup; someone else's order reads as absent.
    let owns: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM orders WHERE id = $1 AND user_id = $2")
            .bind(order_id)
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;
    if owns.is_none() {
        return Err(AppError::NotFound);
    }

    let details =
        sqlx::query_as::<_, ShippingDetails>("SELECT * FROM shipping_details WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(pool)
            .await?;
    let details = match details {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success("Shipping details", details, None))
}

pub async fn create_shipping_details(
    pool: &DbPool,
    user: &AuthUser,
    order_id: Uuid,
    payload: CreateShippingDetailsRequest,
) -> AppResult<ApiResponse<ShippingDetails>> {
    let owns: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM orders WHERE id = $1 AND user_id = $2")
            .bind(order_id)
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;
    if owns.is_none() {
        return Err(AppError::NotFound);
    }

    let details: ShippingDetails = sqlx::query_as(
        r#"
        INSERT INTO shipping_details
            (id, order_id, full_name, address_line1, address_line2, city, state,
             postal_code, country, phone_number, shipping_method)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(payload.full_name)
    .bind(payload.address_line1)
    .bind(payload.address_line2)
    .bind(payload.city)
    .bind(payload.state)
    .bind(payload.postal_code)
    .bind(payload.country)
    .bind(payload.phone_number)
    .bind(payload.shipping_method)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        if err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            AppError::Conflict("shipping details already exist for this order".into())
        } else {
            AppError::DbError(err)
        }
    })?;

    Ok(ApiResponse::success(
        "Shipping details created",
        details,
        Some(Meta::empty()),
    ))
}
