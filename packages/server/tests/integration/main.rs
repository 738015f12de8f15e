mod common;

mod auth;
mod chat;
mod jobs;
mod order;
mod product;
mod retouch;
mod shooting;
