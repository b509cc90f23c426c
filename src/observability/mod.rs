//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! Request IDs (`x-request-id`) are attached by the HTTP layer and show up in
//! the tower-http trace spans.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
