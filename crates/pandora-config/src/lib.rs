//! # Pandora Config
//!
//! Layered configuration for the Pandora export service.
//!
//! Configuration is applied in layers, later layers overriding earlier
//! ones:
//!
//! 1. Defaults built into the code
//! 2. An optional TOML file
//! 3. `PANDORA_*` environment variables
//!
//! ## Example
//!
//! ```
//! use pandora_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! assert_eq!(config.server.http_addr, "0.0.0.0:8080");
//! assert_eq!(config.export.max_entries, 1000);
//! ```

#![doc(html_root_url = "https://docs.rs/pandora-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{ExportSection, LogFormat, LoggingSection, PandoraConfig, ServerSection};
pub use error::ConfigError;
pub use loader::{load_from_env, ConfigLoader};
