// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::auth::{AuthService, TokenService, UserRepository};
use crate::oauth::OAuthService;
use crate::products::ProductService;

/// Database pool, configuration and the services handlers delegate to
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub oauth_service: Arc<OAuthService>,
    pub product_service: Arc<ProductService>,
}

impl AppState {
    /// Wire every service from a migrated pool and loaded configuration.
    /// Spawns the view counter task, so a tokio runtime must be running.
    pub fn new(db: SqlitePool, config: AppConfig, http: Client) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt_secret));
        let users = Arc::new(UserRepository::new(db.clone(), config.bcrypt_cost));

        let auth_service = Arc::new(AuthService::new(users.clone(), tokens.clone()));
        let oauth_service = Arc::new(OAuthService::new(
            config.oauth.clone(),
            http,
            users,
            tokens.clone(),
        ));
        let product_service = Arc::new(ProductService::new(
            db.clone(),
            config.view_counter_capacity,
        ));

        Self {
            db,
            config: Arc::new(config),
            tokens,
            auth_service,
            oauth_service,
            product_service,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over a fresh in-memory database with test configuration
    pub async fn for_tests() -> Self {
        Self::with_config(AppConfig::for_tests()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let pool = super::migrations::test_support::test_pool().await;
        Self::new(pool, config, Client::new())
    }
}
