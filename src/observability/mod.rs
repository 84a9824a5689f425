//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing subscriber, env filter)
//!     → metrics.rs (request counters, template build counters)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached by the HTTP layer and logged per request
//! - Not-found traffic is logged at debug, never as a failure
//! - Handler cancellation is not logged at all

pub mod logging;
pub mod metrics;
