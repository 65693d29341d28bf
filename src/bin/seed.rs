use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use autoparts_api::{config::AppConfig, db::create_pool};
use chrono::{Duration, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let manager_id = ensure_user(&pool, "manager@example.com", "manager123", "manager").await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", "customer").await?;
    seed_catalog(&pool).await?;
    seed_discount(&pool).await?;

    println!(
        "Seed completed. Admin: {admin_id}, Manager: {manager_id}, Customer: {customer_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = [
        ("Brakes", "Pads, discs and calipers"),
        ("Filters", "Oil, air and cabin filters"),
        ("Suspension", "Shocks, struts and springs"),
        ("Electrical", "Batteries, alternators and sensors"),
    ];

    for (name, description) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }
    println!("Seeded categories");

    let products = [
        ("Ceramic Brake Pad Set", "Front axle, low dust", 459900_i64, 40, "Brakes"),
        ("Ventilated Brake Disc", "280mm, single disc", 329900, 25, "Brakes"),
        ("Engine Oil Filter", "Spin-on canister type", 89900, 200, "Filters"),
        ("Cabin Air Filter", "Activated carbon layer", 129900, 150, "Filters"),
        ("Gas Shock Absorber", "Rear, twin-tube", 549900, 30, "Suspension"),
        ("AGM Car Battery 70Ah", "Start-stop compatible", 1299900, 15, "Electrical"),
    ];

    for (name, description, price, stock, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, category_id)
            SELECT $1, $2, $3, $4, $5, c.id FROM categories c WHERE c.name = $6
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(category)
        .execute(pool)
        .await?;
    }
    println!("Seeded products");

    Ok(())
}

async fn seed_discount(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO discounts (id, code, description, percentage, starts_at, ends_at, max_uses, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("WELCOME10")
    .bind("10% off for new customers")
    .bind(10_i32)
    .bind(now)
    .bind(now + Duration::days(90))
    .bind(1000_i32)
    .execute(pool)
    .await?;

    println!("Seeded discount WELCOME10");
    Ok(())
}
