//! Blob storage for uploaded file content.
//!
//! The catalog assigns each entry an immutable stored name at creation;
//! the blob store keeps exactly one blob per name and never interprets
//! the bytes. Metadata backends come and go, blobs always live here.

pub mod filesystem;

use std::io::Cursor;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Boxed async reader handed across the storage boundary.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored name is not a plain flat file name.
    #[error("invalid stored name: {0}")]
    InvalidName(String),
}

/// Blob storage addressed by stored name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `stored_name`, returning the byte count.
    async fn write(&self, stored_name: &str, data: &[u8]) -> Result<u64, StorageError> {
        self.write_stream(stored_name, Box::new(Cursor::new(data.to_vec())))
            .await
    }

    /// Stream data into the blob under `stored_name`, returning the byte
    /// count once the blob is fully published.
    async fn write_stream(
        &self,
        stored_name: &str,
        reader: BoxReader,
    ) -> Result<u64, StorageError>;

    /// Read a whole blob into memory.
    async fn read(&self, stored_name: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(stored_name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a blob as a streaming async reader.
    async fn open(&self, stored_name: &str) -> Result<BoxReader, StorageError>;

    /// Whether a blob is currently stored under `stored_name`.
    async fn exists(&self, stored_name: &str) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, stored_name: &str) -> Result<bool, StorageError>;
}
