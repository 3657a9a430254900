// src/router.rs

use axum::{extract::Extension, Router};
use std::sync::Arc;

use crate::common::AppState;
use crate::{auth, health, oauth, products};

/// Every route the API serves, with shared state attached.
/// CORS and tracing layers are added by `main`.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::health_routes())
        // Password auth and account management
        .merge(auth::auth_routes())
        // Provider sign-in and identity linking
        .merge(oauth::oauth_routes())
        // Catalog
        .merge(products::products_routes())
        .layer(Extension(state))
}
