// Application configuration loaded once at startup

use std::env;
use tracing::warn;

use crate::oauth::OAuthConfig;

const DEFAULT_JWT_SECRET: &str = "replace_with_strong_secret";

/// Work factor bounds accepted by bcrypt
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub reset_db: bool,
    pub port: u16,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub frontend_success_url: String,
    pub frontend_link_url: String,
    pub cors_origins: Vec<String>,
    pub view_counter_capacity: usize,
    pub oauth: OAuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://storefront.db".to_string());

        // RESET_DB - set to "true" to drop and recreate all tables on startup
        let reset_db = env::var("RESET_DB")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using an insecure development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|c| c.parse::<u32>().ok())
            .filter(|c| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(c))
            .unwrap_or(bcrypt::DEFAULT_COST);

        let frontend_success_url = env::var("FRONTEND_SUCCESS_URL")
            .unwrap_or_else(|_| "http://localhost/auth/success".to_string());

        // Where link-mode callbacks hand the code back for POST /api/user/link/:provider
        let frontend_link_url = env::var("FRONTEND_LINK_URL")
            .unwrap_or_else(|_| "http://localhost/account/link".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let view_counter_capacity = env::var("VIEW_COUNTER_CAPACITY")
            .ok()
            .and_then(|c| c.parse::<usize>().ok())
            .filter(|c| *c > 0)
            .unwrap_or(1024);

        Self {
            database_url,
            reset_db,
            port,
            jwt_secret,
            bcrypt_cost,
            frontend_success_url,
            frontend_link_url,
            cors_origins,
            view_counter_capacity,
            oauth: OAuthConfig::from_env(),
        }
    }

    /// Configuration suitable for tests: in-memory database, cheap hashing
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            reset_db: false,
            port: 0,
            jwt_secret: "test_secret_key".to_string(),
            bcrypt_cost: MIN_BCRYPT_COST,
            frontend_success_url: "http://localhost/auth/success".to_string(),
            frontend_link_url: "http://localhost/account/link".to_string(),
            cors_origins: Vec::new(),
            view_counter_capacity: 16,
            oauth: OAuthConfig::for_tests("http://127.0.0.1:0"),
        }
    }
}
