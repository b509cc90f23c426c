//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (BACKEND_URL, RECAPTCHA_SECRET, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once by HttpServer::new
//! ```
//!
//! All fields have defaults so an empty file (or no file) is a valid config.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_effective, ConfigError};
pub use schema::{
    BackendConfig, ChallengeConfig, CorsConfig, GatewayConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, SecurityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
