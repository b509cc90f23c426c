//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → handler.rs (method dispatch, security stages, validation)
//!     → request.rs (caller address for rate limiting and verification)
//!     → forward.rs (POST to backend, relay status/body)
//!     → security headers applied on the way out
//! ```

pub mod forward;
pub mod handler;
pub mod request;
pub mod server;

pub use server::{AppState, HttpServer, ServerError};
