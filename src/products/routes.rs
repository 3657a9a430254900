// src/products/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Public catalog routes
pub fn products_routes() -> Router {
    Router::new()
        .route("/api/products", get(handlers::list_products))
        .route("/api/products/featured", get(handlers::featured_products))
        .route("/api/products/search", get(handlers::search_products))
        .route(
            "/api/products/category/:category",
            get(handlers::products_by_category),
        )
        .route("/api/products/:id", get(handlers::get_product))
        .route("/api/categories", get(handlers::list_categories))
}
