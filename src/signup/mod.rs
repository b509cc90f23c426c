//! Signup submission handling.
//!
//! # Data Flow
//! ```text
//! raw body
//!     → submission.rs (parse JSON, pick email/password/name)
//!     → validate.rs (syntax checks in order, first failure wins)
//!     → validate.rs (sanitize every field)
//!     → SignupSubmission (forwarded to the backend)
//! ```

pub mod submission;
pub mod validate;

pub use submission::SignupSubmission;
pub use validate::{is_valid_email, is_valid_name, is_valid_password, sanitize_string};
