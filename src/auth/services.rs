//! Password-based account lifecycle: register, login, profile, password, deletion

use std::sync::Arc;
use tracing::{info, warn};

use super::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    User, UserResponse,
};
use super::repository::UserRepository;
use super::tokens::TokenService;
use super::validators::AuthValidator;
use crate::common::{safe_email_log, ApiError, Validator};

pub struct AuthService {
    users: Arc<UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    fn respond_with_token(&self, user: &User) -> Result<AuthResponse, ApiError> {
        let token = self.tokens.issue(user.id, &user.email)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ApiError> {
        let validation = AuthValidator.validate(&request);
        if !validation.is_valid {
            return Err(ApiError::from(validation));
        }

        if self.users.email_exists(&request.email).await? {
            info!(email = %safe_email_log(&request.email), "Registration rejected: email taken");
            return Err(ApiError::DuplicateEmail);
        }

        let phone = request.phone.as_deref().filter(|p| !p.is_empty());
        let user = self
            .users
            .create_local_user(
                &request.email,
                &request.password,
                &request.first_name,
                &request.last_name,
                phone,
            )
            .await?;

        info!(user_id = user.id, "User registered");
        self.respond_with_token(&user)
    }

    /// Unknown email, wrong password and deactivated account all produce the
    /// same `InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ApiError> {
        let validation = AuthValidator.validate(&request);
        if !validation.is_valid {
            return Err(ApiError::from(validation));
        }

        let user = match self.users.find_by_email(&request.email).await {
            Ok(user) => user,
            Err(ApiError::NotFound(_)) => {
                warn!(email = %safe_email_log(&request.email), "Login failed: no active account");
                return Err(ApiError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if self
            .users
            .verify_password(&request.password, &user.password_hash)
            .await
            .is_err()
        {
            warn!(user_id = user.id, "Login failed: password mismatch");
            return Err(ApiError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = user.id, "Login failed: account deactivated");
            return Err(ApiError::InvalidCredentials);
        }

        info!(user_id = user.id, "User logged in");
        self.respond_with_token(&user)
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<UserResponse, ApiError> {
        let user = self.users.find_by_id(user_id).await?;
        Ok(UserResponse::from(&user))
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, ApiError> {
        let validation = AuthValidator.validate(&request);
        if !validation.is_valid {
            return Err(ApiError::from(validation));
        }

        let phone = request.phone.as_deref().filter(|p| !p.is_empty());
        self.users
            .update_profile(user_id, &request.first_name, &request.last_name, phone)
            .await?;

        info!(user_id = user_id, "Profile updated");
        self.get_profile(user_id).await
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        let validation = AuthValidator.validate(&request);
        if !validation.is_valid {
            return Err(ApiError::from(validation));
        }

        let user = self.users.find_by_id(user_id).await?;

        if self
            .users
            .verify_password(&request.current_password, &user.password_hash)
            .await
            .is_err()
        {
            warn!(user_id = user_id, "Password change rejected: current password incorrect");
            return Err(ApiError::IncorrectPassword);
        }

        self.users
            .update_password(user_id, &request.new_password)
            .await?;

        info!(user_id = user_id, "Password changed");
        Ok(())
    }

    pub async fn delete_account(&self, user_id: i64) -> Result<(), ApiError> {
        self.users.deactivate(user_id).await
    }
}
