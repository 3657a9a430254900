//! OAuth2 data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::ApiError;

/// External identity providers an account can sign in with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Github,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }

    /// Column on `users` holding this provider's subject id
    pub fn id_column(&self) -> &'static str {
        match self {
            Provider::Google => "google_id",
            Provider::Github => "github_id",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            other => Err(ApiError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Normalized profile obtained from a provider after a code exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalProfile {
    pub provider: Provider,
    pub subject_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Token endpoint response. GitHub reports failures with a 200 and an
/// `error` field, so `access_token` is optional.
#[derive(Debug, Deserialize)]
pub struct ProviderTokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Google `oauth2/v2/userinfo`
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: bool,
}

/// GitHub `/user`
#[derive(Debug, Deserialize)]
pub struct GitHubUserInfo {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// One entry of GitHub `/user/emails`
#[derive(Debug, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
    pub state: String,
}

/// Query string of the provider redirect
#[derive(Debug, Deserialize, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkAccountRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
}
