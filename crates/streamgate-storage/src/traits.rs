//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// The store answered successfully but the object has no content.
    #[error("Object is empty: {0}")]
    EmptyObject(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage operation timed out: {0}")]
    Timeout(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Body of an object, yielded chunk by chunk.
///
/// Dropping the stream aborts the underlying fetch.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// An object opened for streaming.
pub struct StoredObject {
    pub body: ByteStream,
    /// Content type reported by the store, if any.
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Storage abstraction trait
///
/// The gateway only reads from the store: it streams segments, downloads
/// playlists whole, and asks for presigned GET URLs.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open an object for streaming.
    ///
    /// Returns `NotFound` when the key is absent and `EmptyObject` when the store
    /// reports a zero-length object.
    async fn get(&self, storage_key: &str) -> StorageResult<StoredObject>;

    /// Read a whole object into memory (playlists).
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Generate a presigned/temporary URL for direct access (GET)
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Connectivity probe for readiness checks.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
