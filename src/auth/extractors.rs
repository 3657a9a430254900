//! Request authentication gate and the `AuthedUser` extractor

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{safe_email_log, ApiError, AppState};

/// Identity attached to a request by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub id: i64,
    pub email: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// Exactly two space-separated parts are accepted, the first being `Bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers.get(AUTHORIZATION).ok_or_else(|| {
        ApiError::Unauthorized("Authorization header is required".to_string())
    })?;

    let malformed = || ApiError::Unauthorized("Invalid authorization header format".to_string());
    let value = value.to_str().map_err(|_| malformed())?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(malformed()),
    }
}

/// Middleware for protected routes.
///
/// Validates the bearer token and stores an [`AuthedUser`] in the request
/// extensions. On failure the request is answered with 401 and the handler
/// never runs.
pub async fn require_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            warn!(path = %request.uri().path(), "Authentication failed: {}", e);
            return Err(e);
        }
    };

    let claims = state.tokens.validate(token).map_err(|e| {
        warn!(path = %request.uri().path(), "Authentication failed: token rejected");
        ApiError::from(e)
    })?;

    debug!(
        user_id = claims.user_id,
        email = %safe_email_log(&claims.email),
        "Request authenticated"
    );

    request.extensions_mut().insert(AuthedUser {
        id: claims.user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
    }
}
