//! Backend forwarding.
//!
//! The sanitized submission is POSTed as JSON to the configured backend; its
//! status and body are relayed to the caller unchanged. Transport failures
//! become 502 with the underlying error text.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::signup::SignupSubmission;

pub struct BackendForwarder {
    client: reqwest::Client,
    url: Option<String>,
}

impl BackendForwarder {
    /// An empty URL is treated as unset.
    pub fn new(client: reqwest::Client, url: Option<String>) -> Self {
        Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Forward a submission and build the relayed response.
    pub async fn forward(&self, submission: &SignupSubmission) -> Result<Response, GatewayError> {
        let url = self.url.as_deref().ok_or(GatewayError::BackendNotConfigured)?;

        let upstream = self.client.post(url).json(submission).send().await?;
        let status = upstream.status();
        let content_type = upstream
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
        let body = upstream.bytes().await?;

        metrics::record_backend_status(status.as_u16());
        tracing::info!(status = %status, bytes = body.len(), "Backend responded");

        Ok((status, [(CONTENT_TYPE, content_type)], body).into_response())
    }
}
