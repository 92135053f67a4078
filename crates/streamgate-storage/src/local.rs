use crate::keys::content_type_for_key;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Local filesystem storage implementation
///
/// Keys map to paths under `base_path`. A filesystem cannot issue expiring
/// URLs, so presigning always fails and only the proxying routes can serve
/// from this backend.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding the HLS tree (e.g., "/var/lib/streamgate/media")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys with traversal sequences, and keys whose canonical path
    /// (through symlinks) lands outside the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        crate::keys::validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }


    async fn file_len(&self, path: &std::path::Path, storage_key: &str) -> StorageResult<u64> {
        match fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(StorageError::NotFound(storage_key.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn get(&self, storage_key: &str) -> StorageResult<StoredObject> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let size = self.file_len(&path, storage_key).await?;
        if size == 0 {
            return Err(StorageError::EmptyObject(storage_key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let key = storage_key.to_string();
        let path_display = path.display().to_string();
        let body = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        tracing::debug!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            "Local storage get opened"
        );

        Ok(StoredObject {
            body: Box::pin(body),
            content_type: content_type_for_key(storage_key).map(String::from),
            content_length: Some(size),
        })
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        self.file_len(&path, storage_key).await?;

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if data.is_empty() {
            return Err(StorageError::EmptyObject(storage_key.to_string()));
        }

        tracing::debug!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        Err(StorageError::SigningFailed(
            "local storage cannot issue expiring URLs".to_string(),
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(StorageError::ConfigError(format!(
                "{} is not a directory",
                self.base_path.display()
            )))
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, LocalStorage) {
        let dir = tempdir().unwrap();
        for (key, data) in files {
            let path = dir.path().join(key);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_get_streams_segment_with_content_type() {
        let (_dir, storage) = storage_with(&[("videos/V1/480p/seg_001.ts", b"segment-bytes")]).await;

        let object = storage.get("videos/V1/480p/seg_001.ts").await.unwrap();
        assert_eq!(object.content_type.as_deref(), Some("video/MP2T"));
        assert_eq!(object.content_length, Some(13));

        let mut body = object.body;
        let mut downloaded = Vec::new();
        while let Some(chunk) = body.next().await {
            downloaded.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(downloaded, b"segment-bytes");
    }

    #[tokio::test]
    async fn test_missing_and_empty_objects_are_distinct() {
        let (_dir, storage) = storage_with(&[("videos/V1/480p/empty.ts", b"")]).await;

        assert!(matches!(
            storage.get("videos/V1/480p/missing.ts").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.get("videos/V1/480p/empty.ts").await,
            Err(StorageError::EmptyObject(_))
        ));
        assert!(matches!(
            storage.download("videos/V1/480p/empty.ts").await,
            Err(StorageError::EmptyObject(_))
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let (_dir, storage) = storage_with(&[]).await;

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.get("videos/../../etc/passwd.ts").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_download_and_exists() {
        let (_dir, storage) =
            storage_with(&[("videos/V1/master.m3u8", b"#EXTM3U\n720p/playlist.m3u8\n")]).await;

        let data = storage.download("videos/V1/master.m3u8").await.unwrap();
        assert!(data.starts_with(b"#EXTM3U"));
        assert!(storage.exists("videos/V1/master.m3u8").await.unwrap());
        assert!(!storage.exists("videos/V2/master.m3u8").await.unwrap());
        assert!(storage.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_presign_is_refused_instead_of_returning_a_plain_link() {
        let (_dir, storage) = storage_with(&[("videos/V1/720p/playlist.m3u8", b"#EXTM3U\n")]).await;
        let result = storage
            .get_presigned_url("videos/V1/720p/playlist.m3u8", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::SigningFailed(_))));

        let result = storage
            .get_presigned_url("videos/../../etc/passwd", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
