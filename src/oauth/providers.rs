// src/oauth/providers.rs
//! Provider configuration and the HTTP side of the authorization-code flow

use reqwest::{header::ACCEPT, Client};
use serde::de::DeserializeOwned;
use std::env;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::models::{
    ExternalProfile, GitHubEmail, GitHubUserInfo, GoogleUserInfo, Provider, ProviderTokenResponse,
};
use crate::common::{split_full_name, ApiError};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request to {endpoint} failed: {message}")]
    RequestFailed { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },

    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("provider rejected the authorization code: {0}")]
    Rejected(String),

    #[error("provider profile is missing {0}")]
    MissingField(&'static str),

    #[error("no primary email found")]
    NoPrimaryEmail,
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NoPrimaryEmail => ApiError::NoPrimaryEmail,
            other => ApiError::OAuthExchange(other.to_string()),
        }
    }
}

/// Static OAuth2 client settings for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    /// Only GitHub needs a separate call to find the primary email
    pub emails_url: Option<String>,
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    pub fn google(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            profile_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            emails_url: None,
            scopes: vec![
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
            ],
        }
    }

    pub fn github(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            profile_url: "https://api.github.com/user".to_string(),
            emails_url: Some("https://api.github.com/user/emails".to_string()),
            scopes: vec!["user:email".to_string()],
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Settings for every supported provider, built once at startup
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub google: ProviderConfig,
    pub github: ProviderConfig,
}

impl OAuthConfig {
    /// Load provider credentials from environment variables
    pub fn from_env() -> Self {
        let var = |key: &str| env::var(key).unwrap_or_default();
        let redirect = |key: &str, default: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            google: ProviderConfig::google(
                var("GOOGLE_CLIENT_ID"),
                var("GOOGLE_CLIENT_SECRET"),
                redirect(
                    "GOOGLE_REDIRECT_URL",
                    "http://localhost/api/oauth2/google/callback",
                ),
            ),
            github: ProviderConfig::github(
                var("GITHUB_CLIENT_ID"),
                var("GITHUB_CLIENT_SECRET"),
                redirect(
                    "GITHUB_REDIRECT_URL",
                    "http://localhost/api/oauth2/github/callback",
                ),
            ),
        };

        for provider in [Provider::Google, Provider::Github] {
            if !config.get(provider).is_configured() {
                warn!(provider = provider.as_str(), "OAuth client credentials not configured");
            }
        }

        config
    }

    /// Provider endpoints rooted at `base_url`, e.g. a local mock server
    #[cfg(test)]
    pub fn for_tests(base_url: &str) -> Self {
        let endpoints = |mut config: ProviderConfig, name: &str| {
            config.auth_url = format!("{}/{}/authorize", base_url, name);
            config.token_url = format!("{}/{}/token", base_url, name);
            config.profile_url = format!("{}/{}/user", base_url, name);
            if config.emails_url.is_some() {
                config.emails_url = Some(format!("{}/{}/user/emails", base_url, name));
            }
            config
        };

        Self {
            google: endpoints(
                ProviderConfig::google(
                    "google-client".to_string(),
                    "google-secret".to_string(),
                    "http://localhost/api/oauth2/google/callback".to_string(),
                ),
                "google",
            ),
            github: endpoints(
                ProviderConfig::github(
                    "github-client".to_string(),
                    "github-secret".to_string(),
                    "http://localhost/api/oauth2/github/callback".to_string(),
                ),
                "github",
            ),
        }
    }

    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Google => &self.google,
            Provider::Github => &self.github,
        }
    }
}

/// Talks to provider token and profile endpoints
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
}

impl ProviderClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Trade an authorization code for a provider access token
    pub async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<String, ProviderError> {
        let endpoint = config.token_url.as_str();
        debug!(endpoint = %endpoint, "Exchanging authorization code");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_url.as_str()),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(endpoint = %endpoint, http_status = %status, "Token endpoint returned error status");
            return Err(ProviderError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ProviderTokenResponse =
            response.json().await.map_err(|e| ProviderError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => {
                let reason = body
                    .error_description
                    .or(body.error)
                    .unwrap_or_else(|| "no access token in response".to_string());
                Err(ProviderError::Rejected(reason))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        access_token: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(endpoint = %endpoint, http_status = %status, "Profile endpoint returned error status");
            return Err(ProviderError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| ProviderError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch and normalize the provider's view of the signed-in user
    pub async fn fetch_profile(
        &self,
        provider: Provider,
        config: &ProviderConfig,
        access_token: &str,
    ) -> Result<ExternalProfile, ProviderError> {
        match provider {
            Provider::Google => {
                let info: GoogleUserInfo = self.get_json(&config.profile_url, access_token).await?;
                if info.email.is_empty() {
                    return Err(ProviderError::MissingField("email"));
                }
                if !info.verified_email {
                    warn!(provider = "google", "Provider reports unverified email address");
                }
                let (first_name, last_name) = split_full_name(&info.name);
                Ok(ExternalProfile {
                    provider,
                    subject_id: info.id,
                    email: info.email,
                    first_name,
                    last_name,
                    avatar_url: info.picture.filter(|p| !p.is_empty()),
                })
            }
            Provider::Github => {
                let info: GitHubUserInfo = self.get_json(&config.profile_url, access_token).await?;
                let emails_url = config
                    .emails_url
                    .as_deref()
                    .ok_or(ProviderError::MissingField("email endpoint"))?;
                let emails: Vec<GitHubEmail> = self.get_json(emails_url, access_token).await?;

                let primary = emails
                    .into_iter()
                    .find(|e| e.primary)
                    .ok_or(ProviderError::NoPrimaryEmail)?;
                if !primary.verified {
                    warn!(provider = "github", "Primary email is not verified");
                }

                let display_name = info
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| info.login.clone());
                let (first_name, last_name) = split_full_name(&display_name);

                Ok(ExternalProfile {
                    provider,
                    subject_id: info.id.to_string(),
                    email: primary.email,
                    first_name,
                    last_name,
                    avatar_url: info.avatar_url.filter(|a| !a.is_empty()),
                })
            }
        }
    }
}
