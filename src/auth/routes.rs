//! Authentication routes

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use super::extractors::require_auth;
use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/register` - Create a password account
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `POST /api/auth/logout` - Logout (client-side token removal)
/// - `GET|PUT /api/user/profile` - Read or update own profile (bearer)
/// - `PUT /api/user/password` - Change password (bearer)
/// - `DELETE /api/user/account` - Soft-delete own account (bearer)
pub fn auth_routes() -> Router {
    let protected = Router::new()
        .route(
            "/api/user/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/api/user/password", put(handlers::change_password))
        .route("/api/user/account", delete(handlers::delete_account))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .merge(protected)
}
