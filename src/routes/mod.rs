use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod discounts;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod products;
pub mod reviews;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/discounts", discounts::router())
        .nest("/favorites", favorites::router())
        .nest("/reviews", reviews::router())
        .nest("/notifications", notifications::router())
        .nest("/contact", contact::router())
        .nest("/admin", admin::router())
}
