use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

use super::{BlobStore, BoxReader, StorageError};

/// Filesystem-backed blob store.
///
/// Blobs live flat in `base_path` under their stored name. Writes land in
/// a `.staging` subdirectory first and are published with a rename, so a
/// reader never observes a partial blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".staging")).await?;
        Ok(Self { base_path })
    }

    fn blob_path(&self, stored_name: &str) -> Result<PathBuf, StorageError> {
        check_stored_name(stored_name)?;
        Ok(self.base_path.join(stored_name))
    }

    fn staging_path(&self) -> PathBuf {
        self.base_path
            .join(".staging")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Stored names come from the catalog and are always `{id}` or
/// `{id}.{ext}`. A blob store handed a path-like name must refuse it
/// rather than walk the filesystem.
fn check_stored_name(name: &str) -> Result<(), StorageError> {
    let flat = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..");
    if flat {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn write_stream(
        &self,
        stored_name: &str,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let target = self.blob_path(stored_name)?;
        let staged = self.staging_path();

        let outcome: Result<u64, StorageError> = async {
            let mut out = fs::File::create(&staged).await?;
            let written = tokio::io::copy(&mut reader, &mut out).await?;
            out.flush().await?;
            drop(out);
            fs::rename(&staged, &target).await?;
            Ok(written)
        }
        .await;

        if outcome.is_err() {
            let _ = fs::remove_file(&staged).await;
        }
        outcome
    }

    async fn open(&self, stored_name: &str) -> Result<BoxReader, StorageError> {
        let path = self.blob_path(stored_name)?;
        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(stored_name.to_string()),
            _ => StorageError::Io(e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    async fn exists(&self, stored_name: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(stored_name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, stored_name: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
