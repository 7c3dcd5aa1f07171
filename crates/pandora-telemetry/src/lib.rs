//! # Pandora Telemetry
//!
//! Structured logging and export metrics.
//!
//! Logging integrates with the tracing-subscriber ecosystem: JSON output
//! for production, pretty output for development, filter taken from the
//! configuration or `RUST_LOG`. Metrics go through the `metrics` facade;
//! the service bundles no exporter, so an embedder decides where counters
//! land by installing a recorder.

#![doc(html_root_url = "https://docs.rs/pandora-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;
mod metrics;

pub use self::error::{TelemetryError, TelemetryResult};
pub use self::logging::{init_logging, LogConfig};
pub use self::metrics::{
    describe_metrics, record_entries_written, record_export_failed, record_export_started,
};
