//! # Pandora Server
//!
//! HTTP server and export coordinator.
//!
//! This crate ties the service together: a hyper-based HTTP/1.1 accept
//! loop with graceful shutdown, a fixed four-way route table, and the
//! per-request Export Coordinator that drives an entry source into the
//! streaming archive writer (or the document builder) while the response
//! body is already on the wire.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pandora_config::ConfigLoader;
//! use pandora_server::{AppState, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env()?.load()?;
//!     let state = AppState::from_config(config).await;
//!     Server::new(state).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/pandora-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod export;
mod routes;
mod server;
mod shutdown;
mod source;
mod state;

pub use body::{full, ResponseBody, StreamingBody};
pub use routes::Route;
pub use server::{BoundServer, Server, ServerError};
pub use shutdown::{InFlight, InFlightGuard, Shutdown};
pub use source::EntrySource;
pub use state::AppState;
