use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartCount, CartDto, CartItemDto, MergeGuestCartRequest, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        contact::{ContactMessageList, CreateContactMessageRequest},
        discounts::{ApplyDiscountRequest, CreateDiscountRequest, DiscountApplication, DiscountList, UpdateDiscountRequest},
        favorites::{AddFavoriteRequest, FavoriteDto, FavoriteList},
        notifications::{MarkReadRequest, NotificationList},
        orders::{AdminOrderList, CreateOrderRequest, OrderList, OrderSummary, OrderWithItems, UpdateOrderStatusRequest},
        products::{CreateProductRequest, ProductDto, ProductList, UpdateProductRequest, UploadedImages},
        reviews::{CreateReviewRequest, ReviewDto, ReviewList, UpdateReviewRequest},
        shipping::CreateShippingDetailsRequest,
    },
    models::{Category, ContactMessage, Discount, Notification, Order, OrderItem, Product, ProductImage, ShippingDetails, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, categories, contact, discounts, favorites, health, notifications,
        orders, params, products, reviews,
    },
    services::admin_service::DashboardStats,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_images,
        products::set_main_image,
        products::delete_image,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        cart::count_items,
        cart::merge_guest_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::get_shipping_details,
        orders::create_shipping_details,
        discounts::list_discounts,
        discounts::apply_discount,
        discounts::get_discount,
        discounts::create_discount,
        discounts::update_discount,
        discounts::delete_discount,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        reviews::list_product_reviews,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        notifications::list_notifications,
        notifications::list_unread,
        notifications::mark_read,
        notifications::delete_notification,
        contact::create_message,
        contact::list_messages,
        contact::list_unread,
        contact::mark_read,
        admin::dashboard,
        admin::list_all_orders,
        admin::update_order_status,
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            ProductImage,
            Order,
            OrderItem,
            Discount,
            ShippingDetails,
            Notification,
            ContactMessage,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductDto,
            ProductList,
            UploadedImages,
            products::UploadImagesQuery,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            AddToCartRequest,
            UpdateCartItemRequest,
            MergeGuestCartRequest,
            CartItemDto,
            CartDto,
            CartCount,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderSummary,
            OrderList,
            AdminOrderList,
            CreateDiscountRequest,
            UpdateDiscountRequest,
            ApplyDiscountRequest,
            DiscountApplication,
            DiscountList,
            AddFavoriteRequest,
            FavoriteDto,
            FavoriteList,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewDto,
            ReviewList,
            MarkReadRequest,
            NotificationList,
            CreateContactMessageRequest,
            ContactMessageList,
            CreateShippingDetailsRequest,
            DashboardStats,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<ProductDto>,
            ApiResponse<ProductList>,
            ApiResponse<CartDto>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<AdminOrderList>,
            ApiResponse<DashboardStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Discounts", description = "Discount endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Reviews", description = "Review endpoints"),
        (name = "Notifications", description = "Notification endpoints"),
        (name = "Contact", description = "Contact form endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
