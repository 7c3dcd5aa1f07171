//! # Pandora Archive
//!
//! Streaming zip-compatible archive writer.
//!
//! This crate frames a sequence of named byte streams into a single zip
//! container, writing incrementally to any [`tokio::io::AsyncWrite`] sink.
//! It never seeks and never buffers the whole archive: entry sizes are
//! deferred to data descriptors (general-purpose flag bit 3) and the central
//! directory is written once at the end, so the sink can be a one-pass
//! stream such as an HTTP response body.
//!
//! ## Example
//!
//! ```no_run
//! use pandora_archive::ArchiveWriter;
//!
//! # async fn example() -> Result<(), pandora_archive::ArchiveError> {
//! let sink = tokio::io::sink();
//! let mut archive = ArchiveWriter::new(sink);
//!
//! let mut entry = archive.add_entry("report_0000000001.pdf").await?;
//! entry.write(b"%PDF-1.5 ...").await?;
//! entry.finish().await?;
//!
//! archive.finish().await?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/pandora-archive/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod writer;

pub use writer::{ArchiveError, ArchiveResult, ArchiveWriter, EntryWriter};
