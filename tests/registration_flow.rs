use autoparts_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        auth::{Claims, LoginRequest, RegisterRequest},
        cart::AddToCartRequest,
        orders::CreateOrderRequest,
    },
    middleware::auth::AuthUser,
    services::{auth_service, cart_service, order_service},
    state::AppState,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use sqlx::PgPool;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "registration-flow-secret";

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run registration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        uploads_dir: std::env::temp_dir()
            .join("autoparts-test-uploads")
            .to_string_lossy()
            .into_owned(),
    };

    Ok(Some(AppState { pool, orm, config }))
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

// A fresh visitor registers, logs in, fills a cart and places an order.
#[tokio::test]
async fn register_login_cart_and_order() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    // Token signing reads the secret from the environment.
    unsafe {
        std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
    }

    let email = format!("newcomer-{}@example.com", Uuid::new_v4().simple());
    let registered = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            email: email.clone(),
            password: "hunter2hunter2".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registered.email, email);
    assert_eq!(registered.role, "customer");

    // A second registration with the same email is refused.
    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            email: email.clone(),
            password: "hunter2hunter2".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, autoparts_api::error::AppError::BadRequest(_)));

    // The wrong password does not log in.
    let err = auth_service::login_user(
        &state.pool,
        LoginRequest {
            email: email.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, autoparts_api::error::AppError::BadRequest(_)));

    let login = auth_service::login_user(
        &state.pool,
        LoginRequest {
            email: email.clone(),
            password: "hunter2hunter2".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(login.role, "customer");

    // The token carries the new user's id and role.
    let raw_token = login
        .token
        .strip_prefix("Bearer ")
        .expect("token carries the Bearer prefix");
    let claims = decode::<Claims>(
        raw_token,
        &DecodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?
    .claims;
    assert_eq!(claims.sub, registered.id.to_string());
    assert_eq!(claims.role, "customer");

    let user = AuthUser {
        user_id: registered.id,
        role: claims.role,
    };

    let product_id = create_product(&state.pool, 1500, 8).await?;
    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;

    let order = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            shipping_address: "12 Piston Lane".into(),
            discount_code: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(order.order.total_amount, 3000);
    assert_eq!(order.order.status, "pending");
    assert_eq!(order.items.len(), 1);

    // The cart is empty again and stock was left alone.
    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());

    let stock: (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(stock.0, 8);

    Ok(())
}
