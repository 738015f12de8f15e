pub mod category;
pub mod customer_order;
pub mod order_product;
pub mod product;
pub mod product_operation;
pub mod retouch_request;
pub mod retouch_request_product;
pub mod role;
pub mod role_permission;
pub mod shooting_request;
pub mod shooting_request_product;
pub mod user;
pub mod user_profile;
