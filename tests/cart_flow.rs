use autoparts_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::{AddToCartRequest, GuestCartItem, MergeGuestCartRequest, UpdateCartItemRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::cart_service,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn setup_pool() -> anyhow::Result<Option<PgPool>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run cart tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    Ok(Some(pool))
}

async fn create_customer(pool: &PgPool) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, 'dummy', 'customer')")
        .bind(id)
        .bind(format!("cart-{}@example.com", id.simple()))
        .execute(pool)
        .await?;
    Ok(AuthUser {
        user_id: id,
        role: "customer".into(),
    })
}

async fn create_product(pool: &PgPool, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(category_id)
        .bind(format!("cat-{}", category_id.simple()))
        .execute(pool)
        .await?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (id, name, price, stock, category_id) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(format!("part-{}", id.simple()))
    .bind(price)
    .bind(stock)
    .bind(category_id)
    .execute(pool)
    .await?;
    Ok(id)
}

#[tokio::test]
async fn adding_same_product_accumulates_quantity() -> anyhow::Result<()> {
    let pool = match setup_pool().await? {
        Some(pool) => pool,
        None => return Ok(()),
    };
    let user = create_customer(&pool).await?;
    let product_id = create_product(&pool, 500, 10).await?;

    cart_service::add_to_cart(
        &pool,
        &user,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;
    let cart = cart_service::add_to_cart(
        &pool,
        &user,
        AddToCartRequest {
            product_id,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.items[0].item_total, 2500);
    assert_eq!(cart.total_price, 2500);

    Ok(())
}

#[tokio::test]
async fn add_beyond_stock_is_rejected() -> anyhow::Result<()> {
    let pool = match setup_pool().await? {
        Some(pool) => pool,
        None => return Ok(()),
    };
    let user = create_customer(&pool).await?;
    let product_id = create_product(&pool, 500, 4).await?;

    let err = cart_service::add_to_cart(
        &pool,
        &user,
        AddToCartRequest {
            product_id,
            quantity: 5,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Nothing was added.
    let cart = cart_service::get_cart(&pool, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());

    Ok(())
}

#[tokio::test]
async fn update_replaces_quantity_and_remove_drops_line() -> anyhow::Result<()> {
    let pool = match setup_pool().await? {
        Some(pool) => pool,
        None => return Ok(()),
    };
    let user = create_customer(&pool).await?;
    let product_id = create_product(&pool, 1000, 10).await?;

    let cart = cart_service::add_to_cart(
        &pool,
        &user,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    let item_id = cart.items[0].id;

    let cart = cart_service::update_cart_item(
        &pool,
        &user,
        item_id,
        UpdateCartItemRequest { quantity: 7 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.items[0].quantity, 7);

    let cart = cart_service::remove_cart_item(&pool, &user, item_id)
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);

    Ok(())
}

#[tokio::test]
async fn someone_elses_cart_item_reads_as_absent() -> anyhow::Result<()> {
    let pool = match setup_pool().await? {
        Some(pool) => pool,
        None => return Ok(()),
    };
    let owner = create_customer(&pool).await?;
    let intruder = create_customer(&pool).await?;
    let product_id = create_product(&pool, 1000, 10).await?;

    let cart = cart_service::add_to_cart(
        &pool,
        &owner,
        AddToCartRequest {
            product_id,
            quantity: 1,
        },
    )
    .await?
    .data
    .unwrap();
    let item_id = cart.items[0].id;

    let err = cart_service::update_cart_item(
        &pool,
        &intruder,
        item_id,
        UpdateCartItemRequest { quantity: 9 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = cart_service::remove_cart_item(&pool, &intruder, item_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn merge_skips_unknown_products_and_accumulates() -> anyhow::Result<()> {
    let pool = match setup_pool().await? {
        Some(pool) => pool,
        None => return Ok(()),
    };
    let user = create_customer(&pool).await?;
    let product_id = create_product(&pool, 200, 50).await?;

    cart_service::add_to_cart(
        &pool,
        &user,
        AddToCartRequest {
            product_id,
            quantity: 1,
        },
    )
    .await?;

    let cart = cart_service::merge_guest_cart(
        &pool,
        &user,
        MergeGuestCartRequest {
            items: vec![
                GuestCartItem {
                    product_id,
                    quantity: 2,
                },
                GuestCartItem {
                    product_id: Uuid::new_v4(),
                    quantity: 4,
                },
                GuestCartItem {
                    product_id,
                    quantity: 0,
                },
            ],
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);

    let count = cart_service::count_items(&pool, &user).await?.data.unwrap();
    assert_eq!(count.count, 3);

    Ok(())
}
