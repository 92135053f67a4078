use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use streamgate_core::{AppError, ObjectKey, SignedUrl};
use streamgate_storage::Storage;

use crate::upstream::into_app_error;

/// Issues time-limited URLs through the object store's presign capability.
///
/// A signing failure is always an error; there is no unsigned fallback.
#[derive(Clone)]
pub struct Signer {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl Signer {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub async fn sign(&self, key: &ObjectKey) -> Result<SignedUrl, AppError> {
        let issued_at = Utc::now();
        let url = self
            .storage
            .get_presigned_url(key.as_str(), self.ttl)
            .await
            .map_err(|e| into_app_error(e, key.as_str()))?;

        let lifetime = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AppError::Internal(format!("signed URL TTL out of range: {}", e)))?;

        Ok(SignedUrl {
            url,
            expires_at: issued_at + lifetime,
        })
    }
}
