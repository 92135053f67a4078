use async_trait::async_trait;

use crate::error::AppError;
use crate::models::VideoRecord;

/// Read-only view of the video catalog.
///
/// The gateway only ever looks videos up by their logical identifier; creating,
/// updating and deleting records belongs to catalog management outside this service.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// `Ok(None)` when no video has this identifier.
    async fn get_video_by_logical_id(&self, id: &str) -> Result<Option<VideoRecord>, AppError>;

    /// Cheap connectivity probe used by readiness checks.
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
