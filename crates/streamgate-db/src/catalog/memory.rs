use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use streamgate_core::{AppError, Catalog, VideoRecord};

/// Catalog held in memory.
///
/// Counts lookups so tests can assert that rejected requests never reach it.
#[derive(Default)]
pub struct InMemoryCatalog {
    videos: RwLock<HashMap<String, VideoRecord>>,
    lookups: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_videos(videos: impl IntoIterator<Item = VideoRecord>) -> Self {
        let catalog = Self::new();
        for video in videos {
            catalog.insert(video);
        }
        catalog
    }

    /// Load a JSON array of video records (camelCase fields).
    pub async fn from_seed_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read catalog seed {}: {}", path.display(), e)
        })?;
        let videos: Vec<VideoRecord> = serde_json::from_slice(&raw).map_err(|e| {
            anyhow::anyhow!("Invalid catalog seed {}: {}", path.display(), e)
        })?;

        tracing::info!(
            path = %path.display(),
            videos = videos.len(),
            "Loaded in-memory catalog seed"
        );

        Ok(Self::with_videos(videos))
    }

    pub fn insert(&self, video: VideoRecord) {
        self.videos
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(video.id.clone(), video);
    }

    pub fn len(&self) -> usize {
        self.videos
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `get_video_by_logical_id` calls received.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_video_by_logical_id(&self, id: &str) -> Result<Option<VideoRecord>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .videos
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned())
    }
}
