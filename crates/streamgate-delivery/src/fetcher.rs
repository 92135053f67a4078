use std::sync::Arc;

use streamgate_core::{AppError, ObjectKey};
use streamgate_storage::{ByteStream, Storage};

use crate::upstream::into_app_error;

/// Segment bytes ready to be streamed to the client.
pub struct FetchedSegment {
    pub body: ByteStream,
    pub content_type: String,
    pub content_length: Option<u64>,
}

/// Reads objects from the store for the proxy paths.
#[derive(Clone)]
pub struct SegmentFetcher {
    storage: Arc<dyn Storage>,
    fallback_content_type: String,
}

impl SegmentFetcher {
    pub fn new(storage: Arc<dyn Storage>, fallback_content_type: impl Into<String>) -> Self {
        Self {
            storage,
            fallback_content_type: fallback_content_type.into(),
        }
    }

    /// Open a segment for streaming. The body is not buffered; dropping it aborts
    /// the upstream read.
    pub async fn fetch(&self, key: &ObjectKey) -> Result<FetchedSegment, AppError> {
        let object = self
            .storage
            .get(key.as_str())
            .await
            .map_err(|e| into_app_error(e, key.as_str()))?;

        let content_type = object
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| self.fallback_content_type.clone());

        tracing::debug!(
            storage_key = %key,
            content_type = %content_type,
            size_bytes = ?object.content_length,
            "Segment opened"
        );

        Ok(FetchedSegment {
            body: object.body,
            content_type,
            content_length: object.content_length,
        })
    }

    /// Read a playlist whole. Playlists are text; anything that is not UTF-8 is
    /// treated as a corrupt upstream object.
    pub async fn fetch_playlist(&self, key: &ObjectKey) -> Result<String, AppError> {
        let bytes = self
            .storage
            .download(key.as_str())
            .await
            .map_err(|e| into_app_error(e, key.as_str()))?;

        String::from_utf8(bytes).map_err(|_| {
            AppError::upstream_integrity(format!("playlist {} is not valid UTF-8", key))
        })
    }
}
