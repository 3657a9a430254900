//! # Auth Module
//!
//! This module handles password-based authentication and account management:
//! - Credential storage and bcrypt hashing (`repository`)
//! - JWT token issuance and validation (`tokens`)
//! - Registration, login, profile, password change and deletion (`services`)
//! - The bearer-token gate for protected routes (`extractors`)

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod tokens;
pub mod validators;


pub use extractors::{require_auth, AuthedUser};
pub use models::{AuthResponse, UserResponse};
pub use repository::{NewExternalUser, UserRepository};
pub use routes::auth_routes;
pub use services::AuthService;
pub use tokens::TokenService;
