use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::UploadedImages,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::ProductImage,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Public URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads/products";

pub async fn list_images(pool: &DbPool, product_id: Uuid) -> AppResult<Vec<ProductImage>> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT id, product_id, image_path, is_main FROM product_images WHERE product_id = $1 ORDER BY created_at",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(images)
}

/// Store uploaded files under randomized names and record one image row per
/// file. With `set_main`, the first stored file becomes the main image and
/// every other flag for the product is cleared in the same transaction, so
/// the at-most-one-main invariant holds even if we crash mid-way.
pub async fn upload_images(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    files: Vec<(String, Vec<u8>)>,
    set_main: bool,
) -> AppResult<ApiResponse<UploadedImages>> {
    ensure_admin(user)?;

    let product: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    fs::create_dir_all(&state.config.uploads_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    // Write files to disk first; rows only exist for files that made it.
    // The main flag goes to the first file actually stored, so an empty
    // leading field cannot leave the product without a main image.
    let mut stored: Vec<(String, bool)> = Vec::new();
    for (original_name, bytes) in files {
        if bytes.is_empty() {
            continue;
        }
        let file_name = randomized_name(&original_name);
        let disk_path = Path::new(&state.config.uploads_dir).join(&file_name);
        fs::write(&disk_path, &bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let is_main = set_main && stored.is_empty();
        stored.push((format!("{PUBLIC_PREFIX}/{file_name}"), is_main));
    }

    if stored.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    let mut txn = state.pool.begin().await?;

    if set_main {
        sqlx::query("UPDATE product_images SET is_main = FALSE WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *txn)
            .await?;
    }

    let mut items = Vec::with_capacity(stored.len());
    for (image_path, is_main) in stored {
        let image: ProductImage = sqlx::query_as(
            r#"
            INSERT INTO product_images (id, product_id, image_path, is_main)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, image_path, is_main
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(image_path)
        .bind(is_main)
        .fetch_one(&mut *txn)
        .await?;
        items.push(image);
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_images_upload",
        Some("product_images"),
        Some(serde_json::json!({ "product_id": product_id, "count": items.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Images uploaded",
        UploadedImages { items },
        Some(Meta::empty()),
    ))
}

/// Clear-all-then-set-one, in one transaction.
pub async fn set_main_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let mut txn = state.pool.begin().await?;

    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM product_images WHERE id = $1 AND product_id = $2")
            .bind(image_id)
            .bind(product_id)
            .fetch_optional(&mut *txn)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    sqlx::query("UPDATE product_images SET is_main = FALSE WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *txn)
        .await?;

    sqlx::query("UPDATE product_images SET is_main = TRUE WHERE id = $1")
        .bind(image_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Main image set",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn delete_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let removed: Option<(String,)> = sqlx::query_as(
        "DELETE FROM product_images WHERE id = $1 AND product_id = $2 RETURNING image_path",
    )
    .bind(image_id)
    .bind(product_id)
    .fetch_optional(&state.pool)
    .await?;

    let (image_path,) = match removed {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    if let Some(disk_path) = disk_path_for(&state.config.uploads_dir, &image_path) {
        if let Err(err) = fs::remove_file(&disk_path).await {
            tracing::warn!(path = %disk_path.display(), error = %err, "failed to remove image file");
        }
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_image_delete",
        Some("product_images"),
        Some(serde_json::json!({ "product_id": product_id, "image_id": image_id })),
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

/// Best-effort removal of the files behind a set of image rows; used when a
/// product is deleted and the rows go via FK cascade.
pub async fn remove_backing_files(uploads_dir: &str, images: &[ProductImage]) {
    for image in images {
        if let Some(disk_path) = disk_path_for(uploads_dir, &image.image_path) {
            if let Err(err) = fs::remove_file(&disk_path).await {
                tracing::warn!(path = %disk_path.display(), error = %err, "failed to remove image file");
            }
        }
    }
}

fn disk_path_for(uploads_dir: &str, image_path: &str) -> Option<PathBuf> {
    let file_name = image_path.rsplit('/').next()?;
    if file_name.is_empty() {
        return None;
    }
    Some(Path::new(uploads_dir).join(file_name))
}

fn randomized_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}
