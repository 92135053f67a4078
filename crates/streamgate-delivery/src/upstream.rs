use streamgate_core::AppError;
use streamgate_storage::StorageError;

/// Translate a storage failure into the gateway taxonomy.
///
/// Nothing is retried here; retry policy belongs to the object-store client.
pub(crate) fn into_app_error(err: StorageError, key: &str) -> AppError {
    match err {
        StorageError::NotFound(_) => AppError::not_found("Requested media not found"),
        StorageError::EmptyObject(_) => {
            AppError::upstream_integrity(format!("object {} has no content", key))
        }
        StorageError::InvalidKey(_) => AppError::invalid_segment_path(key),
        other => AppError::upstream_unavailable(format!("{} ({})", other, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamgate_core::ErrorMetadata;

    #[test]
    fn test_storage_error_mapping() {
        let key = "videos/V1/480p/seg_001.ts";
        assert_eq!(
            into_app_error(StorageError::NotFound(key.into()), key).http_status_code(),
            404
        );
        assert!(matches!(
            into_app_error(StorageError::EmptyObject(key.into()), key),
            AppError::UpstreamIntegrity(_)
        ));
        assert!(matches!(
            into_app_error(StorageError::InvalidKey(key.into()), key),
            AppError::InvalidSegmentPath(_)
        ));
        assert!(matches!(
            into_app_error(StorageError::Timeout(key.into()), key),
            AppError::UpstreamUnavailable(_)
        ));
        assert!(matches!(
            into_app_error(StorageError::SigningFailed("denied".into()), key),
            AppError::UpstreamUnavailable(_)
        ));
    }
}
