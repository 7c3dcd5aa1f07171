//! Configuration types.
//!
//! This module provides the top-level [`PandoraConfig`] struct and its
//! sections. Use [`ConfigLoader`](crate::ConfigLoader) to load it from a
//! file and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete service configuration.
///
/// # Example
///
/// ```
/// use pandora_config::PandoraConfig;
///
/// let config = PandoraConfig::default();
/// assert_eq!(config.export.s3_bucket, "demo");
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct PandoraConfig {
    /// HTTP server configuration.
    pub server: ServerSection,

    /// Export pipeline configuration.
    pub export: ExportSection,

    /// Logging configuration.
    pub logging: LoggingSection,
}

impl PandoraConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the bind address does not
    /// parse, or any of the export bounds is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.export.max_entries == 0 {
            return Err(ConfigError::invalid_value(
                "export.max_entries",
                "must be at least 1",
            ));
        }

        if self.export.stream_buffer_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "export.stream_buffer_bytes",
                "must be at least 1",
            ));
        }

        if self.export.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "export.timeout_secs",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// HTTP server section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    /// Address the server binds to.
    pub http_addr: String,

    /// Bound on the graceful drain after a shutdown signal.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerSection {
    /// Graceful shutdown bound as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Export pipeline section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ExportSection {
    /// Local document served by the static archive endpoint.
    pub local_document_path: PathBuf,

    /// Bucket served by the remote archive endpoint.
    pub s3_bucket: String,

    /// Object key served by the remote archive endpoint.
    pub s3_key: String,

    /// Optional endpoint override for S3-compatible stacks.
    pub s3_endpoint_url: Option<String>,

    /// Path-style addressing, usually paired with an endpoint override.
    pub s3_force_path_style: bool,

    /// Upper bound on the `generate` parameter.
    pub max_entries: u32,

    /// Capacity of the in-memory pipe feeding the response body; this is
    /// the backpressure bound between export production and the client.
    pub stream_buffer_bytes: usize,

    /// Deadline for one export request.
    pub timeout_secs: u64,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            local_document_path: PathBuf::from("Documents/SamplePDF.pdf"),
            s3_bucket: "demo".to_string(),
            s3_key: "a/folder/SamplePDF.pdf".to_string(),
            s3_endpoint_url: None,
            s3_force_path_style: false,
            max_entries: 1000,
            stream_buffer_bytes: 64 * 1024,
            timeout_secs: 300,
        }
    }
}

impl ExportSection {
    /// Export deadline as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, for production.
    #[default]
    Json,
    /// Human-readable output, for development.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSection {
    /// Log filter (e.g. "info", "pandora=debug,hyper=warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}
