//! Error types for adnstream
//!
//! Handler-level failures are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! Missing sessions and failed stream fetches never reach this type;
//! they are resolved into redirects by the handlers themselves.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Message returned to the browser when the code exchange yields no user.
pub const AUTH_FAILED_MESSAGE: &str = "App.Net auth failed";

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// OAuth2 code exchange produced no user (500)
    #[error("{}", AUTH_FAILED_MESSAGE)]
    AuthFailed,

    /// Provider answered with something unusable (502)
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing key error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::AuthFailed => "auth_failed",
            AppError::Provider(_) => "provider",
            AppError::HttpClient(_) => "http_client",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to an HTTP status code and a JSON error
    /// body. `AuthFailed` is answered in plain text since it is shown
    /// directly to a browser mid-login.
    fn into_response(self) -> Response {
        use axum::Json;

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();

        let (status, error_message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::AuthFailed => {
                return (StatusCode::INTERNAL_SERVER_ERROR, AUTH_FAILED_MESSAGE).into_response();
            }
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Encryption(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
