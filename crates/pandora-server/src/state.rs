//! Process-wide state.

use std::sync::Arc;

use pandora_config::PandoraConfig;
use pandora_storage::ObjectStore;

/// State shared by every request.
///
/// Built once at startup and cloned per connection; everything inside is
/// read-only after construction, so no locks are involved.
#[derive(Clone)]
pub struct AppState {
    /// Loaded, validated configuration.
    pub config: Arc<PandoraConfig>,

    /// Remote object storage handle.
    pub store: ObjectStore,
}

impl AppState {
    /// Build state from configuration, connecting the storage client with
    /// ambient AWS credentials.
    pub async fn from_config(config: PandoraConfig) -> Self {
        let store = ObjectStore::connect(
            config.export.s3_endpoint_url.as_deref(),
            config.export.s3_force_path_style,
        )
        .await;
        Self::with_store(config, store)
    }

    /// Build state around an existing storage handle (used by tests).
    #[must_use]
    pub fn with_store(config: PandoraConfig, store: ObjectStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
