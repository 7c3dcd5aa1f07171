//! S3 client wrapper.

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use thiserror::Error;

/// Result type alias using [`StorageError`].
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by remote storage access.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Opening the object failed (missing object, auth, connectivity).
    #[error("failed to open {bucket}/{key}: {message}")]
    Open {
        /// Bucket that was addressed.
        bucket: String,
        /// Object key that was addressed.
        key: String,
        /// Underlying SDK error rendered with full context.
        message: String,
    },

    /// The object stream failed mid-read.
    #[error("failed while reading {bucket}/{key}: {message}")]
    Read {
        /// Bucket that was addressed.
        bucket: String,
        /// Object key that was addressed.
        key: String,
        /// Underlying stream error rendered as text.
        message: String,
    },
}

/// Process-wide handle to remote object storage.
///
/// Cheap to clone; all clones share the pooled HTTP client.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    client: Client,
}

impl ObjectStore {
    /// Connect using ambient AWS configuration (environment, profile, IMDS).
    ///
    /// `endpoint_url` overrides the service endpoint for S3-compatible
    /// stacks; those usually also need `force_path_style`.
    pub async fn connect(endpoint_url: Option<&str>, force_path_style: bool) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(url) = endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Wrap an already-configured client (used by tests).
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Open a streaming read of one object.
    ///
    /// Every call is an independent network operation with its own failure
    /// mode; nothing is cached between calls.
    pub async fn open(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Open {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: format!("{}", DisplayErrorContext(&e)),
            })?;

        tracing::debug!(bucket, key, "opened object stream");

        Ok(ObjectBody {
            bucket: bucket.to_string(),
            key: key.to_string(),
            inner: output.body,
        })
    }
}

/// Streaming body of one opened object.
#[derive(Debug)]
pub struct ObjectBody {
    bucket: String,
    key: String,
    inner: ByteStream,
}

impl ObjectBody {
    /// Pull the next chunk; `None` means end of object.
    pub async fn next_chunk(&mut self) -> StorageResult<Option<Bytes>> {
        self.inner
            .try_next()
            .await
            .map_err(|e| StorageError::Read {
                bucket: self.bucket.clone(),
                key: self.key.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_store() -> ObjectStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .endpoint_url("http://127.0.0.1:1")
            .force_path_style(true)
            .build();
        ObjectStore::from_client(Client::from_conf(config))
    }

    #[test]
    fn test_store_is_cloneable() {
        let store = offline_store();
        let _clone = store.clone();
    }

    #[tokio::test]
    async fn test_open_error_names_the_object() {
        let store = offline_store();
        let err = store.open("demo", "a/folder/SamplePDF.pdf").await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("demo"));
        assert!(text.contains("a/folder/SamplePDF.pdf"));
    }
}
