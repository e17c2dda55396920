// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::{json_error_handler, AppError};
use crate::web::handlers::{
  account_handlers, auth_handlers, cart_handlers, checkout_handlers, order_handlers, product_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn not_found_handler() -> HttpResponse {
  HttpResponse::NotFound().json(json!({ "error": "Resource not found." }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(
      web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(format!("Invalid resource id: {}", err)).into()),
    )
    .service(
      web::scope("/api/v1") // Base path for API version 1
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/logout", web::post().to(auth_handlers::logout_handler))
            .route("/session", web::get().to(auth_handlers::session_handler)),
        )
        .service(
          web::scope("/users")
            .route("", web::post().to(account_handlers::register_handler))
            .route("/me", web::get().to(account_handlers::profile_handler))
            .route("/me", web::patch().to(account_handlers::update_profile_handler))
            .route("/me", web::delete().to(account_handlers::delete_account_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}", web::patch().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::view_cart_handler))
            .route("/{product_id}", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/{product_id}/remove", web::post().to(cart_handlers::remove_from_cart_handler)),
        )
        .service(
          web::scope("/checkout")
            .route("", web::get().to(checkout_handlers::preview_checkout_handler))
            .route("", web::post().to(checkout_handlers::checkout_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
        )
        .default_service(web::to(not_found_handler)),
    );
}
