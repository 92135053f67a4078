//! Key checks and content-type inference shared by the backends.

use crate::traits::StorageError;

/// Reject keys that could address something outside the store's key space.
pub fn validate_key(storage_key: &str) -> Result<(), StorageError> {
    if storage_key.is_empty()
        || storage_key.starts_with('/')
        || storage_key.contains('\\')
        || storage_key.split('/').any(|part| part == "..")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Content type for an HLS artifact, derived from its key's extension.
///
/// Used by backends that keep no object metadata (local filesystem).
pub fn content_type_for_key(storage_key: &str) -> Option<&'static str> {
    let ext = storage_key.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "m3u8" => Some("application/vnd.apple.mpegurl"),
        "ts" => Some("video/MP2T"),
        "m4s" => Some("video/iso.segment"),
        "mp4" => Some("video/mp4"),
        "aac" => Some("audio/aac"),
        "vtt" => Some("text/vtt"),
        _ => None,
    }
}
