mod traits;

pub mod json;
pub mod memory;
pub mod sql;

use std::path::PathBuf;
use std::sync::Arc;

pub use traits::{Catalog, IdentityStore, Store};

use crate::error::StoreError;

/// Which persistence backend to open.
#[derive(Clone, Debug)]
pub enum BackendConfig {
    /// SQLite through sea-orm.
    Sql { url: String },
    /// The whole state as one JSON document on disk.
    Json { path: PathBuf },
    /// In-process only; state is lost on restart.
    Memory,
}

/// Open the configured backend as a shared store handle.
pub async fn open(config: BackendConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config {
        BackendConfig::Sql { url } => Ok(Arc::new(sql::SqlStore::connect(&url).await?)),
        BackendConfig::Json { path } => Ok(Arc::new(json::JsonStore::open(path).await?)),
        BackendConfig::Memory => Ok(Arc::new(memory::MemoryStore::new())),
    }
}
