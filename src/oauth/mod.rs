//! # OAuth Module
//!
//! Sign-in and account linking through Google and GitHub using the
//! authorization-code flow.

pub mod handlers;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;
pub mod state_store;

#[cfg(test)]
mod tests;

pub use models::Provider;
pub use providers::OAuthConfig;
pub use routes::oauth_routes;
pub use services::OAuthService;
