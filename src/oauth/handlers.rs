//! OAuth2 handlers

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path, Query},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{AuthUrlResponse, CallbackParams, LinkAccountRequest};
use super::state_store::StatePurpose;
use crate::auth::{AuthedUser, UserResponse};
use crate::common::{json_body, safe_token_log, ApiError, AppState};

const SESSION_COOKIE: &str = "token";

fn session_cookie(token: &str) -> String {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::hours(24))
        .build()
        .to_string()
}

/// GET /api/oauth2/:provider/auth
///
/// # Response
/// `{ "auth_url": "https://...", "state": "..." }`
pub async fn get_auth_url(
    Extension(state): Extension<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    let response = state.oauth_service.begin_authorization(&provider).await?;
    Ok(Json(response))
}

/// GET /api/user/link/:provider/auth
///
/// Consent URL whose state only the calling account can redeem at
/// `POST /api/user/link/:provider`.
pub async fn get_link_url(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(provider): Path<String>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    let response = state.oauth_service.begin_link(authed.id, &provider).await?;
    Ok(Json(response))
}

/// GET /api/oauth2/:provider/callback?code=...&state=...
///
/// Sign-in states: sets the `token` cookie and redirects to the frontend
/// with the token in the query string. Link states are left unredeemed and
/// the code is handed to the frontend link page instead.
pub async fn callback(
    Extension(state): Extension<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        warn!(provider = %provider, error = %error, "Provider returned an error to the callback");
        return Err(ApiError::BadRequest(format!(
            "Authorization was not granted: {}",
            error
        )));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Authorization code is required".to_string()))?;
    let oauth_state = params.state.unwrap_or_default();

    if let Some(StatePurpose::Link(_)) = state.oauth_service.state_purpose(&oauth_state).await {
        info!(provider = %provider, "Link callback handed back to frontend");
        let location = format!(
            "{}?provider={}&code={}&state={}",
            state.config.frontend_link_url,
            urlencoding::encode(&provider),
            urlencoding::encode(&code),
            urlencoding::encode(&oauth_state)
        );
        return Ok(Redirect::temporary(&location).into_response());
    }

    let auth = state
        .oauth_service
        .exchange_code(&provider, &code, &oauth_state)
        .await?;

    info!(
        provider = %provider,
        user_id = auth.user.id,
        token = %safe_token_log(&auth.token),
        "OAuth callback completed"
    );

    let location = format!(
        "{}?token={}",
        state.config.frontend_success_url,
        urlencoding::encode(&auth.token)
    );

    Ok((
        [(SET_COOKIE, session_cookie(&auth.token))],
        Redirect::temporary(&location),
    )
        .into_response())
}

/// POST /api/user/link/:provider
///
/// # Request Body
/// `{ "code": "...", "state": "..." }`, where `state` came from
/// `GET /api/user/link/:provider/auth` for the same account
pub async fn link_account(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(provider): Path<String>,
    payload: Result<Json<LinkAccountRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = json_body(payload)?;

    state
        .oauth_service
        .verify_state(&provider, &request.state, StatePurpose::Link(authed.id))
        .await?;

    let user = state
        .oauth_service
        .link_external_to_account(authed.id, &provider, &request.code)
        .await?;
    Ok(Json(user))
}

/// DELETE /api/user/unlink/:provider
pub async fn unlink_account(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(provider): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .oauth_service
        .unlink_external_from_account(authed.id, &provider)
        .await?;
    Ok(Json(user))
}
