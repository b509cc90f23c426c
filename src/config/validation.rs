//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics: addresses parse, URLs
//! are http(s), durations and limits are non-zero, header values are legal.
//! All errors are collected rather than stopping at the first one.
//!
//! An unset backend URL is deliberately accepted here. It surfaces per request
//! as a 500 so the gatekeeper can still start and answer preflights.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if !config.listener.path.starts_with('/') {
        errors.push(ValidationError::new("listener.path", "must start with '/'"));
    }
    if let Some(header) = &config.listener.client_ip_header {
        if HeaderName::try_from(header.as_str()).is_err() {
            errors.push(ValidationError::new(
                "listener.client_ip_header",
                format!("'{header}' is not a valid header name"),
            ));
        }
    }

    if let Some(url) = &config.backend.url {
        if let Err(message) = check_http_url(url) {
            errors.push(ValidationError::new("backend.url", message));
        }
    }
    if let Err(message) = check_http_url(&config.challenge.verify_url) {
        errors.push(ValidationError::new("challenge.verify_url", message));
    }

    let rl = &config.rate_limit;
    if rl.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than zero"));
    }
    if rl.max_attempts == 0 {
        errors.push(ValidationError::new("rate_limit.max_attempts", "must be greater than zero"));
    }
    if rl.max_backoff_secs < rl.window_secs {
        errors.push(ValidationError::new(
            "rate_limit.max_backoff_secs",
            "must be at least rate_limit.window_secs",
        ));
    }
    if rl.sweep_interval == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_interval", "must be greater than zero"));
    }

    if HeaderValue::from_str(&config.cors.allowed_origin).is_err() || config.cors.allowed_origin.is_empty() {
        errors.push(ValidationError::new(
            "cors.allowed_origin",
            "must be a non-empty header value",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' is not one of: pretty, json", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}' is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}
