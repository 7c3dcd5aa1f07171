//! # Pandora
//!
//! **Streaming document/archive export service**
//!
//! Pandora exposes four GET endpoints that stream either a zip archive of
//! documents or one multi-page generated PDF:
//!
//! | Route | Payload |
//! |---|---|
//! | `/static-pdf` | zip of N copies of a configured local file |
//! | `/static-s3` | zip of N fetches of a configured remote object |
//! | `/dynamic-pdf` | zip of N freshly generated one-page documents |
//! | `/dynamic-pdf-single` | one generated document with N pages |
//!
//! Archives are framed on the fly, with no seeking and no whole-archive
//! buffering. The response pipe's capacity is the backpressure bound, so a
//! slow client throttles entry production instead of growing memory.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pandora::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = pandora::config::load_from_env()?;
//!     let state = AppState::from_config(config).await;
//!     Server::new(state).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/pandora/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use pandora_core as core;

// Re-export the archive writer
pub use pandora_archive as archive;

// Re-export document assembly
pub use pandora_pdf as pdf;

// Re-export remote storage access
pub use pandora_storage as storage;

// Re-export the server
pub use pandora_server as server;

// Re-export configuration
pub use pandora_config as config;

// Re-export telemetry
pub use pandora_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use pandora::prelude::*;
/// ```
pub mod prelude {
    pub use pandora_archive::{ArchiveError, ArchiveWriter, EntryWriter};
    pub use pandora_config::{ConfigLoader, PandoraConfig};
    pub use pandora_core::{ExportError, ExportOrigin, ExportRequest, ExportResult};
    pub use pandora_pdf::DocumentBuilder;
    pub use pandora_server::{AppState, Server, Shutdown};
    pub use pandora_storage::ObjectStore;
}
