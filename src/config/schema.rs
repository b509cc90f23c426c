//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the signup gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, route path).
    pub listener: ListenerConfig,

    /// Signup backend the validated payload is forwarded to.
    pub backend: BackendConfig,

    /// Human-presence challenge verification.
    pub challenge: ChallengeConfig,

    /// Per-identifier rate limiting with exponential backoff.
    pub rate_limit: RateLimitConfig,

    /// CORS settings.
    pub cors: CorsConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the signup endpoint is mounted on.
    pub path: String,

    /// Header carrying the caller's address when running behind an edge proxy.
    /// Falls back to the TCP peer address when absent.
    pub client_ip_header: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path: "/".to_string(),
            client_ip_header: Some("cf-connecting-ip".to_string()),
        }
    }
}

/// Signup backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend URL. Requests are rejected with 500 while this is unset.
    pub url: Option<String>,
}

/// Challenge verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChallengeConfig {
    /// Enable challenge verification.
    pub enabled: bool,

    /// Shared secret sent to the verification service.
    pub secret: String,

    /// Verification endpoint.
    pub verify_url: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: String::new(),
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Window in which attempts accumulate, in seconds.
    pub window_secs: u64,

    /// Attempts allowed per window before a block is applied.
    pub max_attempts: u32,

    /// Upper bound for the exponential block duration, in seconds.
    pub max_backoff_secs: u64,

    /// Extra time a record is kept past its deadline, in seconds.
    pub expiry_margin_secs: u64,

    /// Prefix for store keys.
    pub key_prefix: String,

    /// Number of store writes between full sweeps of expired records.
    pub sweep_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            max_attempts: 5,
            max_backoff_secs: 60 * 60,
            expiry_margin_secs: 10,
            key_prefix: "rl".to_string(),
            sweep_interval: 1024,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// The single origin allowed to call the endpoint.
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "https://infosecbyalex.xyz".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024, // 64KB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for each outbound call (verification, backend) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
