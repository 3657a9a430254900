// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),
    DuplicateEmail,
    InvalidCredentials,
    Unauthorized(String),
    IncorrectPassword,
    NotFound(String),
    BadRequest(String),
    UnsupportedProvider(String),
    InvalidOAuthState,
    IdentityAlreadyLinked,
    OAuthExchange(String),
    NoPrimaryEmail,
    InternalServer(String),
    DatabaseError(sqlx::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::DuplicateEmail => write!(f, "user with this email already exists"),
            ApiError::InvalidCredentials => write!(f, "invalid email or password"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::IncorrectPassword => write!(f, "current password is incorrect"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::UnsupportedProvider(provider) => {
                write!(f, "unsupported provider: {}", provider)
            }
            ApiError::InvalidOAuthState => write!(f, "invalid or expired OAuth state"),
            ApiError::IdentityAlreadyLinked => {
                write!(f, "external identity is already linked to another account")
            }
            ApiError::OAuthExchange(msg) => write!(f, "OAuth exchange failed: {}", msg),
            ApiError::NoPrimaryEmail => write!(f, "no primary email found"),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    /// HTTP status and stable machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::DuplicateEmail => (StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::IncorrectPassword => (StatusCode::BAD_REQUEST, "INCORRECT_PASSWORD"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::UnsupportedProvider(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_PROVIDER"),
            ApiError::InvalidOAuthState => (StatusCode::BAD_REQUEST, "INVALID_OAUTH_STATE"),
            ApiError::IdentityAlreadyLinked => {
                (StatusCode::BAD_REQUEST, "IDENTITY_ALREADY_LINKED")
            }
            ApiError::OAuthExchange(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "OAUTH_EXCHANGE_ERROR")
            }
            ApiError::NoPrimaryEmail => (StatusCode::INTERNAL_SERVER_ERROR, "NO_PRIMARY_EMAIL"),
            ApiError::InternalServer(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
            ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();

        let error_message = match self {
            ApiError::ValidationError(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg) => msg,
            ApiError::OAuthExchange(detail) => {
                error!(error = %detail, "OAuth provider exchange failed");
                "Failed to complete authorization with provider".to_string()
            }
            ApiError::InternalServer(msg) => {
                error!(error = %msg, "Internal server error");
                "Internal server error".to_string()
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                "Database operation failed".to_string()
            }
            other => other.to_string(),
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}
