//! Error types for Pandora.
//!
//! This module provides [`ExportError`], the standard error type used
//! throughout the service. Every variant maps to an HTTP status code and a
//! stable error code string; errors raised before streaming begins are
//! rendered as a JSON envelope, errors raised mid-stream abort the response.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`ExportError`].
pub type ExportResult<T> = Result<T, ExportError>;

/// Standard error type for Pandora export operations.
///
/// # Example
///
/// ```
/// use pandora_core::ExportError;
///
/// fn parse_count(raw: &str) -> Result<u32, ExportError> {
///     raw.parse()
///         .map_err(|_| ExportError::invalid_request(format!("not an integer: {raw}")))
/// }
///
/// assert!(parse_count("abc").is_err());
/// ```
#[derive(Error, Debug)]
pub enum ExportError {
    /// The request was malformed (bad or out-of-range `generate` parameter).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
    },

    /// A local source document does not exist or cannot be opened.
    #[error("document not found: {path}")]
    NotFound {
        /// Path of the missing document.
        path: String,
    },

    /// The remote object store failed to serve an object.
    #[error("remote storage unavailable for {bucket}/{key}: {message}")]
    RemoteUnavailable {
        /// Bucket that was addressed.
        bucket: String,
        /// Object key that was addressed.
        key: String,
        /// Underlying storage error rendered as text.
        message: String,
    },

    /// The client disconnected or the export deadline elapsed.
    #[error("export cancelled: {reason}")]
    Cancelled {
        /// What interrupted the export.
        reason: String,
    },

    /// Document assembly failed.
    #[error("document generation failed: {message}")]
    Document {
        /// Underlying generation error rendered as text.
        message: String,
    },

    /// Archive framing failed (duplicate entry, poisoned session, size limit).
    #[error("archive error: {message}")]
    Archive {
        /// Underlying archive error rendered as text.
        message: String,
    },

    /// I/O error not attributable to a more specific variant.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Create an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a not-found error for a local document path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a remote-storage error.
    pub fn remote_unavailable(
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RemoteUnavailable {
            bucket: bucket.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Create a document-generation error.
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    /// Create an archive-framing error.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Classify an I/O error from the response sink.
    ///
    /// A broken pipe on the sink means the client went away; everything else
    /// stays an I/O error.
    pub fn from_sink_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
                Self::cancelled("client disconnected")
            }
            _ => Self::Io(err),
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::RemoteUnavailable { .. } => "REMOTE_UNAVAILABLE",
            Self::Cancelled { .. } => "CANCELLED",
            Self::Document { .. } => "DOCUMENT_ERROR",
            Self::Archive { .. } => "ARCHIVE_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// HTTP status code for this error.
    ///
    /// Only meaningful while the response has not started streaming; once
    /// bytes are committed the connection is simply closed.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RemoteUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Document { .. } | Self::Archive { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this error represents cancellation rather than failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Render the JSON error envelope used for pre-stream failures.
    #[must_use]
    pub fn to_envelope(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
    }
}
