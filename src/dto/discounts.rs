use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Discount;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub code: String,
    pub description: Option<String>,
    pub percentage: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_uses: Option<i32>,
    pub category_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDiscountRequest {
    pub description: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyDiscountRequest {
    pub code: String,
}

/// Outcome of a redemption attempt. A miss never says whether the code was
/// wrong, expired, or capped out.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountApplication {
    pub valid: bool,
    pub message: String,
    pub percentage: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct DiscountList {
    #[schema(value_type = Vec<Discount>)]
    pub items: Vec<Discount>,
}
