//! Authentication and account handlers

use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::extractors::AuthedUser;
use super::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    UpdateProfileRequest, UserResponse,
};
use crate::common::{json_body, ApiError, AppState};

/// POST /api/auth/register
///
/// # Request Body
/// ```json
/// { "email": "...", "password": "...", "first_name": "...", "last_name": "...", "phone": "..." }
/// ```
///
/// # Response
/// `201` with `{ "user": { ... }, "token": "<jwt>" }`
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let request = json_body(payload)?;
    let response = state.auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request = json_body(payload)?;
    let response = state.auth_service.login(request).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
/// Tokens are stateless, so logout is the client dropping its token
pub async fn logout() -> Json<MessageResponse> {
    info!("User logout acknowledged");
    Json(MessageResponse::new("Logged out successfully"))
}

/// GET /api/user/profile
pub async fn get_profile(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state.auth_service.get_profile(authed.id).await?;
    Ok(Json(profile))
}

/// PUT /api/user/profile
pub async fn update_profile(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = json_body(payload)?;
    let profile = state.auth_service.update_profile(authed.id, request).await?;
    Ok(Json(profile))
}

/// PUT /api/user/password
pub async fn change_password(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = json_body(payload)?;
    state.auth_service.change_password(authed.id, request).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// DELETE /api/user/account
pub async fn delete_account(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service.delete_account(authed.id).await?;
    Ok(Json(MessageResponse::new("Account deleted successfully")))
}
