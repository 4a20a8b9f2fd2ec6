//! Prometheus metrics and structured logging for the Bittrex stream client.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for forwarded/dropped events, decode errors and
//!   session terminations

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
