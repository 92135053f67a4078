//! Request parameter validation
//!
//! All checks here run before any catalog or object-store call, so a rejected
//! request never costs upstream I/O.

use crate::constants::CATALOG_ID_LEN;
use crate::error::AppError;

/// Catalog identifiers are 24 hexadecimal characters.
pub fn validate_video_id(id: &str) -> Result<(), AppError> {
    if id.len() == CATALOG_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(AppError::invalid_identifier(id))
    }
}

/// Identifiers of the processed-video family carry no format requirement, but they
/// become a key segment, so they must not be able to change directories.
pub fn validate_processed_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.contains("..") || id.contains('/') || id.contains('\\') {
        return Err(AppError::invalid_identifier(id));
    }
    Ok(())
}

/// A segment file name: non-empty, no `..`, no separators, ends with `extension`.
pub fn validate_segment_name(segment: &str, extension: &str) -> Result<(), AppError> {
    if segment.contains('/') || segment.contains('\\') {
        return Err(AppError::invalid_segment_path(segment));
    }
    validate_segment_path(segment, extension)
}

/// A segment path relative to a video's base directory, e.g. `720p/seg_001.ts`.
pub fn validate_segment_path(path: &str, extension: &str) -> Result<(), AppError> {
    if path.is_empty()
        || path.contains("..")
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains("//")
        || !path.ends_with(extension)
        || path.len() == extension.len()
    {
        return Err(AppError::invalid_segment_path(path));
    }
    Ok(())
}

/// Quality rungs are single directory names; `allowed` is an optional allow-list.
pub fn validate_quality(quality: &str, allowed: &[String]) -> Result<(), AppError> {
    if quality.is_empty() || quality.contains("..") || quality.contains('/') || quality.contains('\\')
    {
        return Err(AppError::InvalidQuality(format!(
            "Invalid quality '{}'",
            quality
        )));
    }
    if !allowed.is_empty() && !allowed.iter().any(|q| q == quality) {
        return Err(AppError::InvalidQuality(format!(
            "Quality '{}' is not available",
            quality
        )));
    }
    Ok(())
}
