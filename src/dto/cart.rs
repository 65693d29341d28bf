use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestCartItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Pre-auth cart held in client storage; it has no server-side identity
/// until merged at login.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MergeGuestCartRequest {
    pub items: Vec<GuestCartItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: i64,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub item_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartDto {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub items: Vec<CartItemDto>,
    pub total_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCount {
    pub count: i64,
}
