use std::sync::Arc;

use catalog::quota::Quota;
use catalog::storage::BlobStore;
use catalog::storage::filesystem::FilesystemBlobStore;
use catalog::store::{self, Store};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub quota: Quota,
    pub config: AppConfig,
}

impl AppState {
    /// Open the configured backend and blob directory.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let backend = config.backend()?;
        let store = store::open(backend).await?;
        let blobs = FilesystemBlobStore::new(config.storage.upload_dir.clone()).await?;

        Ok(Self {
            store,
            blobs: Arc::new(blobs),
            quota: Quota::new(config.storage.capacity),
            config,
        })
    }
}
