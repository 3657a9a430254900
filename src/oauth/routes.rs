use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::auth::require_auth;

/// OAuth2 router
///
/// # Routes
/// - `GET /api/oauth2/:provider/auth` - Consent URL and state
/// - `GET /api/oauth2/:provider/callback` - Provider redirect target
/// - `GET /api/user/link/:provider/auth` - Consent URL for linking (bearer)
/// - `POST /api/user/link/:provider` - Link an identity (bearer)
/// - `DELETE /api/user/unlink/:provider` - Unlink an identity (bearer)
pub fn oauth_routes() -> Router {
    let protected = Router::new()
        .route("/api/user/link/:provider/auth", get(handlers::get_link_url))
        .route("/api/user/link/:provider", post(handlers::link_account))
        .route("/api/user/unlink/:provider", delete(handlers::unlink_account))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/oauth2/:provider/auth", get(handlers::get_auth_url))
        .route("/api/oauth2/:provider/callback", get(handlers::callback))
        .merge(protected)
}
