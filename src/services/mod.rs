pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod contact_service;
pub mod discount_service;
pub mod favorite_service;
pub mod image_service;
pub mod notification_service;
pub mod order_service;
pub mod product_service;
pub mod review_service;
pub mod shipping_service;
