use axum::routing::{get, post};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/shooting-requests", shooting_routes())
        .nest("/retouch-requests", retouch_routes())
        .route("/chat/webhook/{secret}", post(handlers::chat::webhook))
}

// Auth endpoints are deliberately left out of the API doc.
fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn product_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::product::intake))
        .routes(routes!(handlers::product::current_products))
        .routes(routes!(handlers::product::get_product))
        .routes(routes!(handlers::product::mark_defect))
        .routes(routes!(handlers::product::list_operations))
}

fn order_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::order::create_order))
        .routes(routes!(handlers::order::get_order))
        .routes(routes!(handlers::order::accept_start))
        .routes(routes!(handlers::order::accept_product))
        .routes(routes!(handlers::order::accept_end))
}

fn shooting_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::shooting::list_requests,
            handlers::shooting::create_request
        ))
        .routes(routes!(handlers::shooting::get_request))
        .routes(routes!(
            handlers::shooting::add_barcode,
            handlers::shooting::remove_barcode
        ))
        .routes(routes!(handlers::shooting::override_type))
        .routes(routes!(handlers::shooting::unlock_type))
        .routes(routes!(handlers::shooting::shooting_start))
        .routes(routes!(handlers::shooting::shooting_result))
        .routes(routes!(handlers::shooting::photo_check))
}

fn retouch_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::retouch::list_requests,
            handlers::retouch::create_request
        ))
        .routes(routes!(handlers::retouch::update_result))
        .routes(routes!(handlers::retouch::get_request))
        .routes(routes!(handlers::retouch::update_status))
        .routes(routes!(handlers::retouch::reassign))
        .routes(routes!(handlers::retouch::download_files))
        .routes(routes!(handlers::retouch::review_product))
}
