//! OAuth2 sign-in, account creation and identity linking

use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{AuthUrlResponse, ExternalProfile, Provider};
use super::providers::{OAuthConfig, ProviderClient};
use super::state_store::{OAuthStateStore, StatePurpose};
use crate::auth::{AuthResponse, NewExternalUser, TokenService, UserRepository, UserResponse};
use crate::common::{safe_email_log, ApiError};

const STATE_BYTES: usize = 16;

pub struct OAuthService {
    config: OAuthConfig,
    client: ProviderClient,
    states: OAuthStateStore,
    users: Arc<UserRepository>,
    tokens: Arc<TokenService>,
}

impl OAuthService {
    pub fn new(
        config: OAuthConfig,
        http: reqwest::Client,
        users: Arc<UserRepository>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            config,
            client: ProviderClient::new(http),
            states: OAuthStateStore::default(),
            users,
            tokens,
        }
    }

    /// Provider consent URL carrying `state`
    pub fn build_authorization_url(&self, provider: &str, state: &str) -> Result<String, ApiError> {
        let provider: Provider = provider.parse()?;
        let config = self.config.get(provider);

        let scope = config.scopes.join(" ");
        let params = [
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_url.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if config.auth_url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", config.auth_url, separator, query))
    }

    pub fn generate_state() -> String {
        let mut bytes = [0u8; STATE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE.encode(bytes)
    }

    /// Issue a sign-in state bound to `provider` and the URL to send the browser to
    pub async fn begin_authorization(&self, provider: &str) -> Result<AuthUrlResponse, ApiError> {
        self.begin(provider, StatePurpose::SignIn).await
    }

    /// Same as `begin_authorization`, but the state can only be redeemed by
    /// `user_id` through the link endpoint
    pub async fn begin_link(&self, user_id: i64, provider: &str) -> Result<AuthUrlResponse, ApiError> {
        self.begin(provider, StatePurpose::Link(user_id)).await
    }

    async fn begin(&self, provider: &str, purpose: StatePurpose) -> Result<AuthUrlResponse, ApiError> {
        let parsed: Provider = provider.parse()?;
        let state = Self::generate_state();
        let auth_url = self.build_authorization_url(provider, &state)?;

        self.states.insert(&state, parsed, purpose).await;
        info!(provider = parsed.as_str(), purpose = ?purpose, "Authorization started");

        Ok(AuthUrlResponse { auth_url, state })
    }

    /// Consume `state`; fails unless it was issued for `provider` and
    /// `purpose` and is unexpired
    pub async fn verify_state(
        &self,
        provider: &str,
        state: &str,
        purpose: StatePurpose,
    ) -> Result<(), ApiError> {
        let provider: Provider = provider.parse()?;
        if state.is_empty() || !self.states.consume(state, provider, purpose).await {
            warn!(provider = provider.as_str(), "Rejected OAuth state");
            return Err(ApiError::InvalidOAuthState);
        }
        Ok(())
    }

    /// Purpose of an outstanding state, if it is still live
    pub async fn state_purpose(&self, state: &str) -> Option<StatePurpose> {
        self.states.peek(state).await
    }

    async fn fetch_external_profile(
        &self,
        provider: Provider,
        code: &str,
    ) -> Result<ExternalProfile, ApiError> {
        if code.is_empty() {
            return Err(ApiError::BadRequest("Authorization code is required".to_string()));
        }

        let config = self.config.get(provider);
        let access_token = self.client.exchange_code(config, code).await?;
        let profile = self
            .client
            .fetch_profile(provider, config, &access_token)
            .await?;
        Ok(profile)
    }

    /// Sign in with a provider, creating the account on first use
    pub async fn exchange_code(
        &self,
        provider: &str,
        code: &str,
        state: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.verify_state(provider, state, StatePurpose::SignIn).await?;
        let provider: Provider = provider.parse()?;

        let profile = self.fetch_external_profile(provider, code).await?;

        let user = match self
            .users
            .find_by_external_id(provider, &profile.subject_id)
            .await
        {
            Ok(existing) if !existing.is_active => {
                warn!(user_id = existing.id, provider = provider.as_str(), "OAuth login to deactivated account");
                return Err(ApiError::InvalidCredentials);
            }
            Ok(existing) => existing,
            Err(ApiError::NotFound(_)) => {
                let new_user = NewExternalUser {
                    email: profile.email.clone(),
                    first_name: profile.first_name.clone(),
                    last_name: profile.last_name.clone(),
                    provider: profile.provider,
                    subject_id: profile.subject_id.clone(),
                    avatar_url: profile.avatar_url.clone(),
                };
                self.users.create_external_user(&new_user).await?
            }
            Err(e) => return Err(e),
        };

        info!(
            user_id = user.id,
            email = %safe_email_log(&user.email),
            provider = provider.as_str(),
            "OAuth login succeeded"
        );

        let token = self.tokens.issue(user.id, &user.email)?;
        Ok(AuthResponse {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Attach a provider identity to an already signed-in account
    pub async fn link_external_to_account(
        &self,
        user_id: i64,
        provider: &str,
        code: &str,
    ) -> Result<UserResponse, ApiError> {
        let provider: Provider = provider.parse()?;
        let profile = self.fetch_external_profile(provider, code).await?;

        let (google_id, github_id) = match provider {
            Provider::Google => (Some(profile.subject_id.as_str()), None),
            Provider::Github => (None, Some(profile.subject_id.as_str())),
        };

        self.users
            .link_external_identity(
                user_id,
                provider,
                google_id,
                github_id,
                profile.avatar_url.as_deref(),
            )
            .await?;

        let user = self.users.find_by_id(user_id).await?;
        Ok(UserResponse::from(&user))
    }

    pub async fn unlink_external_from_account(
        &self,
        user_id: i64,
        provider: &str,
    ) -> Result<UserResponse, ApiError> {
        let provider: Provider = provider.parse()?;
        self.users.unlink_external_identity(user_id, provider).await?;

        let user = self.users.find_by_id(user_id).await?;
        Ok(UserResponse::from(&user))
    }

    /// Drop states that expired without being redeemed
    pub async fn prune_expired_states(&self) -> usize {
        self.states.prune_expired().await
    }

    #[cfg(test)]
    pub(crate) async fn pending_states(&self) -> usize {
        self.states.len().await
    }
}
