pub mod auth;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod discounts;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod shipping;
