//! Request body limits.
//!
//! The signup body is buffered once, up front, because three stages read it
//! (identifier, challenge token, signup fields). Oversized bodies are rejected
//! with 413 before any of them run; a body that fails to arrive is a 400.

use axum::body::{Body, Bytes};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::error::GatewayError;

/// Buffer a request body, failing if it exceeds `max_bytes`.
pub async fn read_body(body: Body, max_bytes: usize) -> Result<Bytes, GatewayError> {
    match Limited::new(body, max_bytes).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            tracing::debug!(limit = max_bytes, "Request body over limit");
            Err(GatewayError::PayloadTooLarge)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(GatewayError::InvalidBody)
        }
    }
}
