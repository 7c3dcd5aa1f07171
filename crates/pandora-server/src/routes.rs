//! Route table.
//!
//! The surface is a closed set of five GET routes; dispatch is a single
//! match, not a routing tree.

use http::Method;
use pandora_core::ExportOrigin;

/// The routes the service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/static-pdf`: archive of copies of the configured local file.
    StaticArchive,
    /// `/static-s3`: archive of fetches of the configured remote object.
    RemoteArchive,
    /// `/dynamic-pdf`: archive of freshly generated documents.
    GeneratedArchive,
    /// `/dynamic-pdf-single`: one generated document with N pages.
    GeneratedSingle,
    /// `/health`: service liveness.
    Health,
}

impl Route {
    /// Match a request line against the route table.
    #[must_use]
    pub fn match_request(method: &Method, path: &str) -> Option<Self> {
        if method != Method::GET {
            return None;
        }
        match path {
            "/static-pdf" => Some(Self::StaticArchive),
            "/static-s3" => Some(Self::RemoteArchive),
            "/dynamic-pdf" => Some(Self::GeneratedArchive),
            "/dynamic-pdf-single" => Some(Self::GeneratedSingle),
            "/health" => Some(Self::Health),
            _ => None,
        }
    }

    /// Export origin for this route, if it is an export route.
    #[must_use]
    pub fn origin(self) -> Option<ExportOrigin> {
        match self {
            Self::StaticArchive => Some(ExportOrigin::Local),
            Self::RemoteArchive => Some(ExportOrigin::Remote),
            Self::GeneratedArchive => Some(ExportOrigin::Generated),
            Self::GeneratedSingle => Some(ExportOrigin::GeneratedSingle),
            Self::Health => None,
        }
    }
}

/// Raw value of the `generate` query parameter, if present.
///
/// Returns the value exactly as it appeared; validation happens in
/// [`pandora_core::ExportRequest::parse`].
#[must_use]
pub fn generate_param(query: Option<&str>) -> Option<&str> {
    let query = query?;
    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        if key == "generate" {
            return Some(value);
        }
    }
    None
}
