pub mod auth;
pub mod chat;
pub mod order;
pub mod product;
pub mod retouch;
pub mod shooting;
