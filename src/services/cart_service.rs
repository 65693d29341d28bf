use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{
        AddToCartRequest, CartCount, CartDto, CartItemDto, MergeGuestCartRequest,
        UpdateCartItemRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartLineRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    product_price: i64,
    product_image: Option<String>,
    quantity: i32,
}

#[derive(FromRow)]
struct ProductStockRow {
    id: Uuid,
    stock: i32,
}

pub async fn get_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartDto>> {
    let cart: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;

    // No cart row yet: an empty, ephemeral view. Nothing is persisted.
    let Some((cart_id,)) = cart else {
        return Ok(ApiResponse::success(
            "OK",
            CartDto {
                id: None,
                user_id: user.user_id,
                items: Vec::new(),
                total_price: 0,
            },
            None,
        ));
    };

    let dto = load_cart_dto(pool, cart_id, user.user_id).await?;
    Ok(ApiResponse::success("OK", dto, None))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartDto>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product: Option<ProductStockRow> =
        sqlx::query_as("SELECT id, stock FROM products WHERE id = $1")
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if product.stock < payload.quantity {
        return Err(AppError::BadRequest(
            "Insufficient stock available".to_string(),
        ));
    }

    let cart_id = get_or_create_cart(pool, user.user_id).await?;

    // A (cart, product) pair maps to at most one line; adding again bumps
    // the quantity instead of inserting a duplicate.
    sqlx::query(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product.id)
    .bind(payload.quantity)
    .execute(pool)
    .await?;

    touch_cart(pool, cart_id).await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = load_cart_dto(pool, cart_id, user.user_id).await?;
    Ok(ApiResponse::success("Added to cart", dto, None))
}

pub async fn update_cart_item(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartDto>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    // Ownership is part of the lookup: someone else's item reads as absent.
    #[derive(FromRow)]
    struct ItemRow {
        cart_id: Uuid,
        stock: i32,
    }
    let item: Option<ItemRow> = sqlx::query_as(
        r#"
        SELECT ci.cart_id, p.stock
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        WHERE ci.id = $1 AND c.user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?;

    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    if item.stock < payload.quantity {
        return Err(AppError::BadRequest(
            "Insufficient stock available".to_string(),
        ));
    }

    sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
        .bind(item_id)
        .bind(payload.quantity)
        .execute(pool)
        .await?;

    touch_cart(pool, item.cart_id).await?;

    let dto = load_cart_dto(pool, item.cart_id, user.user_id).await?;
    Ok(ApiResponse::success("Cart item updated", dto, None))
}

pub async fn remove_cart_item(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartDto>> {
    let removed: Option<(Uuid,)> = sqlx::query_as(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
        RETURNING ci.cart_id
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?;

    let (cart_id,) = match removed {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    touch_cart(pool, cart_id).await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = load_cart_dto(pool, cart_id, user.user_id).await?;
    Ok(ApiResponse::success("Removed from cart", dto, None))
}

pub async fn clear_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;

    let (cart_id,) = match cart {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(pool)
        .await?;

    touch_cart(pool, cart_id).await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn count_items(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartCount>> {
    let total: (Option<i64>,) = sqlx::query_as(
        r#"
        SELECT SUM(ci.quantity)::BIGINT
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        WHERE c.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        CartCount {
            count: total.0.unwrap_or(0),
        },
        None,
    ))
}

/// Fold a client-held guest cart into the server-side cart at login.
/// Products that vanished since the guest added them are skipped silently.
pub async fn merge_guest_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: MergeGuestCartRequest,
) -> AppResult<ApiResponse<CartDto>> {
    let cart_id = get_or_create_cart(pool, user.user_id).await?;

    for guest_item in &payload.items {
        if guest_item.quantity <= 0 {
            continue;
        }

        // The product lookup is part of the insert itself, so a product
        // deleted mid-merge skips cleanly instead of tripping the FK.
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity)
            SELECT $1, $2, p.id, $4 FROM products p WHERE p.id = $3
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cart_id)
        .bind(guest_item.product_id)
        .bind(guest_item.quantity)
        .execute(pool)
        .await?;
    }

    touch_cart(pool, cart_id).await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_merge",
        Some("cart_items"),
        Some(serde_json::json!({ "incoming": payload.items.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = load_cart_dto(pool, cart_id, user.user_id).await?;
    Ok(ApiResponse::success("Cart merged", dto, None))
}

async fn get_or_create_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO carts (id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn touch_cart(pool: &DbPool, cart_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn load_cart_dto(pool: &DbPool, cart_id: Uuid, user_id: Uuid) -> AppResult<CartDto> {
    let rows: Vec<CartLineRow> = sqlx::query_as(
        r#"
        SELECT ci.id, ci.product_id, p.name AS product_name, p.price AS product_price,
               (SELECT pi.image_path FROM product_images pi
                WHERE pi.product_id = p.id AND pi.is_main LIMIT 1) AS product_image,
               ci.quantity
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    let items: Vec<CartItemDto> = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_price: row.product_price,
            product_image: row.product_image,
            item_total: row.product_price * row.quantity as i64,
            quantity: row.quantity,
        })
        .collect();

    let total_price = items.iter().map(|i| i.item_total).sum();

    Ok(CartDto {
        id: Some(cart_id),
        user_id,
        items,
        total_price,
    })
}
