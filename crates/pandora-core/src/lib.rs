//! # Pandora Core
//!
//! Core types for the Pandora export service.
//!
//! This crate carries the pieces every other Pandora crate agrees on:
//!
//! - [`ExportError`]: the service-wide error taxonomy with HTTP status
//!   mapping and the JSON error envelope
//! - [`ExportRequest`] / [`ExportOrigin`]: the validated per-request model
//! - entry naming helpers shared by the archive variants

#![doc(html_root_url = "https://docs.rs/pandora-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;

pub use error::{ExportError, ExportResult};
pub use request::{document_title, entry_name, file_stem, ExportOrigin, ExportRequest};
