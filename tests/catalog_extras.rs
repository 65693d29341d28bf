use autoparts_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        favorites::AddFavoriteRequest,
        reviews::{CreateReviewRequest, UpdateReviewRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{favorite_service, image_service, review_service},
    state::AppState,
};
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run catalog tests.");
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

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, 'dummy', $3)")
        .bind(id)
        .bind(format!("extras-{}@example.com", id.simple()))
        .bind(role)
        .execute(&state.pool)
        .await?;
    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

async fn create_product(state: &AppState) -> anyhow::Result<Uuid> {
    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(category_id)
        .bind(format!("cat-{}", category_id.simple()))
        .execute(&state.pool)
        .await?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (id, name, price, stock, category_id) VALUES ($1, $2, 1000, 10, $3)",
    )
    .bind(id)
    .bind(format!("part-{}", id.simple()))
    .bind(category_id)
    .execute(&state.pool)
    .await?;
    Ok(id)
}

#[tokio::test]
async fn duplicate_favorite_is_rejected_without_change() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };
    let user = create_user(&state, "customer").await?;
    let product_id = create_product(&state).await?;

    favorite_service::add_favorite(&state.pool, &user, AddFavoriteRequest { product_id }).await?;

    let err = favorite_service::add_favorite(&state.pool, &user, AddFavoriteRequest { product_id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let favorites = favorite_service::list_favorites(&state.pool, &user)
        .await?
        .data
        .unwrap();
    assert_eq!(favorites.items.len(), 1);

    favorite_service::remove_favorite(&state.pool, &user, product_id).await?;
    let err = favorite_service::remove_favorite(&state.pool, &user, product_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn review_rating_bounds_and_ownership() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };
    let author = create_user(&state, "customer").await?;
    let stranger = create_user(&state, "customer").await?;
    let product_id = create_product(&state).await?;

    let err = review_service::create_review(
        &state.pool,
        &author,
        CreateReviewRequest {
            product_id,
            rating: 6,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let review = review_service::create_review(
        &state.pool,
        &author,
        CreateReviewRequest {
            product_id,
            rating: 4,
            comment: Some("Solid pads".into()),
        },
    )
    .await?
    .data
    .unwrap();

    // Only the author can touch the review.
    let err = review_service::update_review(
        &state.pool,
        &stranger,
        review.id,
        UpdateReviewRequest {
            rating: 1,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let updated = review_service::update_review(
        &state.pool,
        &author,
        review.id,
        UpdateReviewRequest {
            rating: 5,
            comment: Some("Even better after bedding in".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.rating, 5);
    assert!(updated.updated_at.is_some());

    let listed = review_service::list_product_reviews(&state.pool, product_id)
        .await?
        .data
        .unwrap();
    assert!(listed.items.iter().any(|r| r.id == review.id));

    review_service::delete_review(&state.pool, &author, review.id).await?;

    Ok(())
}

async fn count_mains(pool: &sqlx::PgPool, product_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM product_images WHERE product_id = $1 AND is_main",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

// The main-image invariant must survive uploads and deletes, not just the
// explicit set-main switch.
#[tokio::test]
async fn upload_and_delete_preserve_single_main() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };
    let admin = create_user(&state, "admin").await?;
    let product_id = create_product(&state).await?;

    let first_batch = image_service::upload_images(
        &state,
        &admin,
        product_id,
        vec![
            ("front.jpg".into(), b"front".to_vec()),
            ("side.jpg".into(), b"side".to_vec()),
        ],
        true,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(first_batch.items.len(), 2);
    assert!(first_batch.items[0].is_main);
    assert!(!first_batch.items[1].is_main);
    assert_eq!(count_mains(&state.pool, product_id).await?, 1);

    // An empty leading field is skipped; the flag lands on the first file
    // that was actually stored.
    let second_batch = image_service::upload_images(
        &state,
        &admin,
        product_id,
        vec![
            ("ghost.jpg".into(), Vec::new()),
            ("rear.jpg".into(), b"rear".to_vec()),
        ],
        true,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(second_batch.items.len(), 1);
    assert!(second_batch.items[0].is_main);
    assert_eq!(count_mains(&state.pool, product_id).await?, 1);

    // Deleting the main image leaves the rest unflagged rather than doubled.
    image_service::delete_image(&state, &admin, product_id, second_batch.items[0].id).await?;
    assert_eq!(count_mains(&state.pool, product_id).await?, 0);

    let err = image_service::delete_image(&state, &admin, product_id, second_batch.items[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

// Switching the main image must leave exactly one row flagged.
#[tokio::test]
async fn set_main_image_keeps_single_main() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };
    let admin = create_user(&state, "admin").await?;
    let product_id = create_product(&state).await?;

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    for (id, is_main) in [(first, true), (second, false)] {
        sqlx::query(
            "INSERT INTO product_images (id, product_id, image_path, is_main) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(product_id)
        .bind(format!("/uploads/products/{}.jpg", id.simple()))
        .bind(is_main)
        .execute(&state.pool)
        .await?;
    }

    image_service::set_main_image(&state, &admin, product_id, second).await?;

    let mains: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM product_images WHERE product_id = $1 AND is_main",
    )
    .bind(product_id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(mains.0, 1);

    let flagged: (bool,) = sqlx::query_as("SELECT is_main FROM product_images WHERE id = $1")
        .bind(second)
        .fetch_one(&state.pool)
        .await?;
    assert!(flagged.0);

    // An image belonging to a different product cannot become this one's main.
    let other_product = create_product(&state).await?;
    let err = image_service::set_main_image(&state, &admin, other_product, second)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
