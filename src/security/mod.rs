//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (bounded body read)
//!     → identifier.rs + rate_limit.rs (per email/IP backoff, backed by store.rs)
//!     → challenge.rs (human-presence token verification)
//!     → Pass to signup validation
//!
//! Outgoing response:
//!     → headers.rs (security + CORS headers on everything)
//! ```
//!
//! Every check fails closed: a request that cannot be classified is rejected.

pub mod challenge;
pub mod headers;
pub mod identifier;
pub mod limits;
pub mod rate_limit;
pub mod store;

pub use challenge::ChallengeVerifier;
pub use headers::ResponseHeaders;
pub use identifier::Identifier;
pub use rate_limit::{Decision, RateLimitPolicy, RateLimitRecord, RateLimiter};
