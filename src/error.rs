//! Request-level errors and their HTTP mapping.
//!
//! Every rejection the gatekeeper produces is a plain-text body with a status
//! code. The variants fall in four classes: malformed input (4xx the caller can
//! fix), abuse signals (429/403), configuration errors (500) and upstream
//! failures (502).

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Signup field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    Name,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::Name => "name",
        })
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid {0}")]
    InvalidField(Field),

    #[error("Too Many Requests. Please try again later.")]
    RateLimited,

    #[error("CAPTCHA verification failed")]
    ChallengeFailed,

    #[error("Backend URL not configured")]
    BackendNotConfigured,

    #[error("Backend error: {0}")]
    Backend(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::InvalidBody | GatewayError::InvalidJson | GatewayError::InvalidField(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::ChallengeFailed => StatusCode::FORBIDDEN,
            GatewayError::BackendNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::MethodNotAllowed => "method_not_allowed",
            GatewayError::PayloadTooLarge => "payload_too_large",
            GatewayError::InvalidBody => "invalid_body",
            GatewayError::InvalidJson => "invalid_json",
            GatewayError::InvalidField(_) => "invalid_field",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::ChallengeFailed => "challenge_failed",
            GatewayError::BackendNotConfigured => "backend_not_configured",
            GatewayError::Backend(_) => "backend_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::BackendNotConfigured | GatewayError::Backend(_) => {
                tracing::error!(error = %self, "Request failed")
            }
            GatewayError::RateLimited | GatewayError::ChallengeFailed => {
                tracing::warn!(error = %self, "Request rejected")
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }
        (self.status(), self.to_string()).into_response()
    }
}
