//! Per-request export model.
//!
//! An [`ExportRequest`] is built once from the query string when a request
//! arrives and is immutable afterwards. Entry names are a pure function of
//! (origin, index) so that re-running a request reproduces the archive
//! byte for byte.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// Width of the zero-padded entry index suffix.
const INDEX_WIDTH: usize = 10;

/// The closed set of places an export draws its documents from.
///
/// Dispatched once at request start; the set is never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportOrigin {
    /// Copies of a fixed file on local storage.
    Local,
    /// Fetches of a fixed (bucket, key) object from remote storage.
    Remote,
    /// Freshly generated one-page documents, one per entry.
    Generated,
    /// One generated document with one page per requested unit.
    GeneratedSingle,
}

impl ExportOrigin {
    /// Short label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Generated => "generated",
            Self::GeneratedSingle => "generated-single",
        }
    }

    /// Filename advertised in the `Content-Disposition` header.
    #[must_use]
    pub fn attachment_filename(self) -> &'static str {
        match self {
            Self::GeneratedSingle => "document.pdf",
            _ => "document.zip",
        }
    }

    /// Whether this origin produces a zip archive (vs. a single document).
    #[must_use]
    pub fn is_archive(self) -> bool {
        !matches!(self, Self::GeneratedSingle)
    }
}

impl std::fmt::Display for ExportOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated export request.
///
/// # Example
///
/// ```
/// use pandora_core::{ExportOrigin, ExportRequest};
///
/// let req = ExportRequest::parse(ExportOrigin::Generated, Some("5"), 1000).unwrap();
/// assert_eq!(req.count, 5);
///
/// // Missing parameter defaults to one document.
/// let req = ExportRequest::parse(ExportOrigin::Local, None, 1000).unwrap();
/// assert_eq!(req.count, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    /// Where entry content comes from.
    pub origin: ExportOrigin,
    /// How many entries (or pages) to produce.
    pub count: u32,
}

impl ExportRequest {
    /// Parse and validate the raw `generate` query parameter.
    ///
    /// A missing parameter means one document. Non-integer, non-positive,
    /// and values above `max_entries` are rejected; the caller turns the
    /// error into an HTTP 400 before any response byte is written.
    pub fn parse(
        origin: ExportOrigin,
        raw_generate: Option<&str>,
        max_entries: u32,
    ) -> ExportResult<Self> {
        let count = match raw_generate {
            None | Some("") => 1,
            Some(raw) => {
                let value: i64 = raw.trim().parse().map_err(|_| {
                    ExportError::invalid_request(format!("generate is not an integer: {raw:?}"))
                })?;
                if value < 1 {
                    return Err(ExportError::invalid_request(format!(
                        "generate must be positive, got {value}"
                    )));
                }
                if value > i64::from(max_entries) {
                    return Err(ExportError::invalid_request(format!(
                        "generate exceeds the configured maximum of {max_entries}"
                    )));
                }
                value as u32
            }
        };

        Ok(Self { origin, count })
    }
}

/// Name of the archive entry at `index` (1-based) for a document stem.
///
/// Names are unique and deterministic for a given (stem, index); recreating
/// an archive therefore reproduces the same member list.
///
/// # Example
///
/// ```
/// use pandora_core::entry_name;
///
/// assert_eq!(entry_name("SamplePDF", 1), "SamplePDF_0000000001.pdf");
/// assert_eq!(entry_name("dynamic-pdf", 42), "dynamic-pdf_0000000042.pdf");
/// ```
#[must_use]
pub fn entry_name(stem: &str, index: u32) -> String {
    format!("{stem}_{index:0INDEX_WIDTH$}.pdf")
}

/// File stem of a local path or object key.
///
/// Works for slash-separated object keys as well as filesystem paths:
/// `a/folder/SamplePDF.pdf` yields `SamplePDF`.
#[must_use]
pub fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map_or_else(|| path.to_string(), |s| s.to_string_lossy().into_owned())
}

/// Title line rendered into generated documents.
#[must_use]
pub fn document_title(index: u32) -> String {
    format!("Document {index:0INDEX_WIDTH$}")
}
