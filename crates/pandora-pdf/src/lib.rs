//! # Pandora PDF
//!
//! Minimal PDF document assembly.
//!
//! The export endpoints only ever need one kind of document: one centered
//! line of text per page, Helvetica at a fixed size. [`DocumentBuilder`]
//! assembles exactly that and serializes to bytes; the output is fully
//! deterministic for a given page list, which keeps repeated exports
//! byte-for-byte identical.

#![doc(html_root_url = "https://docs.rs/pandora-pdf/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;

pub use builder::{DocumentBuilder, PdfError, PdfResult};
