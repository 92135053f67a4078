//! Process-local storage backend.
//!
//! Holds objects in a map and records every call it receives, which makes it
//! the store of choice for tests that must prove a request never reached
//! storage. Signed URLs use a `memory://` scheme with the expiry in the query.

use crate::keys::{content_type_for_key, validate_key};
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// Chunk size used when streaming objects, so multi-chunk bodies are exercised.
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: Option<String>,
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, MemoryObject>>,
    calls: Mutex<Vec<String>>,
    call_count: AtomicUsize,
    fail_signing: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object; `content_type` of `None` leaves the type unreported.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>, content_type: Option<&str>) {
        let object = MemoryObject {
            data: data.into(),
            content_type: content_type.map(String::from),
        };
        self.objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), object);
    }

    /// Store an object with the content type its extension implies.
    pub fn with_object(self, key: &str, data: impl Into<Bytes>) -> Self {
        self.insert(key, data, content_type_for_key(key));
        self
    }

    /// Make every presign call fail.
    pub fn fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }

    /// Make every call fail as if the store could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of calls received, of any kind.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Calls received, as `"{operation} {key}"`, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, operation: &str, key: &str) -> StorageResult<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(format!("{} {}", operation, key));
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError(
                "memory store marked unavailable".to_string(),
            ));
        }
        validate_key(key)
    }

    fn lookup(&self, key: &str) -> StorageResult<MemoryObject> {
        let object = self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        if object.data.is_empty() {
            return Err(StorageError::EmptyObject(key.to_string()));
        }
        Ok(object)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, storage_key: &str) -> StorageResult<StoredObject> {
        self.record("get", storage_key)?;
        let object = self.lookup(storage_key)?;

        let len = object.data.len() as u64;
        let data = object.data;
        let chunks: Vec<Result<Bytes, StorageError>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
            .collect();

        Ok(StoredObject {
            body: Box::pin(futures::stream::iter(chunks)),
            content_type: object.content_type,
            content_length: Some(len),
        })
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.record("download", storage_key)?;
        Ok(self.lookup(storage_key)?.data.to_vec())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.record("presign", storage_key)?;
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::SigningFailed(
                "memory store signing disabled".to_string(),
            ));
        }
        Ok(format!(
            "memory:///{}?expires_in={}",
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.record("exists", storage_key)?;
        Ok(self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(storage_key))
    }

    async fn health_check(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
