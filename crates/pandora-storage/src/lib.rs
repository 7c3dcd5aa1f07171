//! # Pandora Storage
//!
//! Remote object storage access for the export endpoints.
//!
//! [`ObjectStore`] wraps the AWS S3 client behind the one operation the
//! service needs: open a streaming read of a (bucket, key) pair. The store
//! is constructed once at startup and cloned per request; the underlying
//! client is connection-pooled and holds no per-request mutable state.
//!
//! A custom endpoint URL plus force-path-style addressing makes the store
//! work against S3-compatible stacks (LocalStack, MinIO) in development.

#![doc(html_root_url = "https://docs.rs/pandora-storage/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod store;

pub use store::{ObjectBody, ObjectStore, StorageError, StorageResult};
