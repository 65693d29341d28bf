use autoparts_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::discounts::ApplyDiscountRequest,
    services::discount_service,
    state::AppState,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run discount tests."
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

async fn insert_discount(
    state: &AppState,
    code: &str,
    percentage: i32,
    max_uses: Option<i32>,
    starts_at: chrono::DateTime<Utc>,
    ends_at: chrono::DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO discounts (id, code, description, percentage, starts_at, ends_at, max_uses, is_active)
        VALUES ($1, $2, NULL, $3, $4, $5, $6, TRUE)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(code)
    .bind(percentage)
    .bind(starts_at)
    .bind(ends_at)
    .bind(max_uses)
    .execute(&state.pool)
    .await?;
    Ok(())
}

// A capped code handed to concurrent buyers must redeem exactly cap times.
#[tokio::test]
async fn capped_code_never_overshoots_under_concurrency() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let code = format!("CAP-{}", Uuid::new_v4().simple());
    let now = Utc::now();
    insert_discount(
        &state,
        &code,
        15,
        Some(3),
        now - Duration::hours(1),
        now + Duration::days(1),
    )
    .await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            discount_service::apply_discount(&state, ApplyDiscountRequest { code }).await
        }));
    }

    let mut hits = 0;
    for handle in handles {
        let response = handle.await??;
        if response.data.unwrap().valid {
            hits += 1;
        }
    }
    assert_eq!(hits, 3, "cap of 3 must yield exactly 3 redemptions");

    let uses: (i32,) = sqlx::query_as("SELECT current_uses FROM discounts WHERE code = $1")
        .bind(&code)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(uses.0, 3);

    Ok(())
}

#[tokio::test]
async fn unknown_code_gets_generic_message() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let response = discount_service::apply_discount(
        &state,
        ApplyDiscountRequest {
            code: format!("NOPE-{}", Uuid::new_v4().simple()),
        },
    )
    .await?;
    let outcome = response.data.unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.message, "Invalid or expired discount code");
    assert!(outcome.percentage.is_none());

    Ok(())
}

#[tokio::test]
async fn expired_code_is_rejected_without_detail() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let code = format!("OLD-{}", Uuid::new_v4().simple());
    let now = Utc::now();
    insert_discount(
        &state,
        &code,
        20,
        None,
        now - Duration::days(30),
        now - Duration::days(1),
    )
    .await?;

    let response =
        discount_service::apply_discount(&state, ApplyDiscountRequest { code: code.clone() }).await?;
    let outcome = response.data.unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.message, "Invalid or expired discount code");

    // A failed attempt does not consume a use.
    let uses: (i32,) = sqlx::query_as("SELECT current_uses FROM discounts WHERE code = $1")
        .bind(&code)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(uses.0, 0);

    Ok(())
}

#[tokio::test]
async fn uncapped_code_within_window_applies() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let code = format!("OPEN-{}", Uuid::new_v4().simple());
    let now = Utc::now();
    insert_discount(
        &state,
        &code,
        25,
        None,
        now - Duration::hours(1),
        now + Duration::days(1),
    )
    .await?;

    let response =
        discount_service::apply_discount(&state, ApplyDiscountRequest { code }).await?;
    let outcome = response.data.unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.percentage, Some(25));

    Ok(())
}
