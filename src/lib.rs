//! Signup gatekeeper library.
//!
//! An edge service in front of a signup backend: it rate limits per email or
//! address with exponential backoff, verifies a human-presence challenge,
//! validates and sanitizes the submission, forwards it, and decorates every
//! response with security and CORS headers.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod signup;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
