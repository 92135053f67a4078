//! Key resolution
//!
//! Maps a logical request onto the object-store key it addresses. Keys are a
//! trusted base prefix (from the catalog record, or the deterministic processed
//! pattern) joined with request-supplied parts that were validated beforehand.

use streamgate_core::constants::VARIANT_PLAYLIST_NAME;
use streamgate_core::{AppError, ObjectKey, RequestShape, VideoRecord};

/// Where a video's HLS tree lives.
#[derive(Debug, Clone, Copy)]
pub enum KeySource<'a> {
    /// Catalog-backed: the tree sits next to `video.video_url`.
    Catalog(&'a VideoRecord),
    /// Deterministic `{prefix}/{video_id}/...` layout; no catalog record exists.
    Processed { prefix: &'a str, video_id: &'a str },
}

impl KeySource<'_> {
    /// Directory every key of this video lives under, with a trailing `/`.
    pub fn base_prefix(&self) -> String {
        match self {
            KeySource::Catalog(video) => video.base_prefix().to_string(),
            KeySource::Processed { prefix, video_id } => format!("{}/{}/", prefix, video_id),
        }
    }

    fn master_key(&self) -> String {
        match self {
            KeySource::Catalog(video) => video.video_url.clone(),
            KeySource::Processed { .. } => format!("{}master.m3u8", self.base_prefix()),
        }
    }
}

/// Resolve a request shape to the object key it addresses.
pub fn resolve(source: KeySource<'_>, shape: &RequestShape) -> Result<ObjectKey, AppError> {
    let base = source.base_prefix();
    let key = match shape {
        RequestShape::Master => source.master_key(),
        RequestShape::Variant { quality } => {
            format!("{}{}/{}", base, quality, VARIANT_PLAYLIST_NAME)
        }
        RequestShape::Segment {
            quality: Some(quality),
            segment,
        } => format!("{}{}/{}", base, quality, segment),
        RequestShape::Segment {
            quality: None,
            segment,
        } => format!("{}{}", base, segment),
    };
    ObjectKey::new(key)
}

/// Join a playlist reference onto the directory of the playlist containing it.
///
/// `.` and `..` segments are folded; `None` when the result would climb above
/// the store root or the reference contains an empty path segment. Query strings
/// and fragments are not part of the key and are dropped.
pub fn join_reference(playlist_dir: &str, reference: &str) -> Option<String> {
    let reference = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    if reference.is_empty() || reference.starts_with('/') || reference.contains('\\') {
        return None;
    }

    let mut parts: Vec<&str> = playlist_dir.split('/').filter(|p| !p.is_empty()).collect();
    for part in reference.split('/') {
        match part {
            "" => return None,
            "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_v1() -> VideoRecord {
        VideoRecord {
            id: "V1".to_string(),
            video_url: "videos/V1/master.m3u8".to_string(),
            course_id: "c1".to_string(),
            title: "Lesson".to_string(),
            duration: None,
            thumbnail_url: None,
        }
    }

    #[test]
    fn test_resolve_catalog_shapes() {
        let video = video_v1();
        let source = KeySource::Catalog(&video);

        assert_eq!(
            resolve(source, &RequestShape::Master).unwrap().as_str(),
            "videos/V1/master.m3u8"
        );
        assert_eq!(
            resolve(
                source,
                &RequestShape::Variant {
                    quality: "720p".into()
                }
            )
            .unwrap()
            .as_str(),
            "videos/V1/720p/playlist.m3u8"
        );
        assert_eq!(
            resolve(
                source,
                &RequestShape::Segment {
                    quality: Some("480p".into()),
                    segment: "seg_001.ts".into()
                }
            )
            .unwrap()
            .as_str(),
            "videos/V1/480p/seg_001.ts"
        );
        assert_eq!(
            resolve(
                source,
                &RequestShape::Segment {
                    quality: None,
                    segment: "480p/seg_001.ts".into()
                }
            )
            .unwrap()
            .as_str(),
            "videos/V1/480p/seg_001.ts"
        );
    }

    #[test]
    fn test_resolve_processed_pattern() {
        let source = KeySource::Processed {
            prefix: "videos",
            video_id: "job-42",
        };
        assert_eq!(
            resolve(
                source,
                &RequestShape::Variant {
                    quality: "360p".into()
                }
            )
            .unwrap()
            .as_str(),
            "videos/job-42/360p/playlist.m3u8"
        );
        assert_eq!(
            resolve(
                source,
                &RequestShape::Segment {
                    quality: Some("360p".into()),
                    segment: "seg_009.ts".into()
                }
            )
            .unwrap()
            .as_str(),
            "videos/job-42/360p/seg_009.ts"
        );
    }

    #[test]
    fn test_resolve_never_yields_traversal() {
        let video = video_v1();
        let shape = RequestShape::Segment {
            quality: Some("480p".into()),
            segment: "../../../etc/passwd.ts".into(),
        };
        assert!(matches!(
            resolve(KeySource::Catalog(&video), &shape),
            Err(AppError::InvalidSegmentPath(_))
        ));
    }

    #[test]
    fn test_join_reference() {
        assert_eq!(
            join_reference("videos/V1/", "720p/playlist.m3u8").as_deref(),
            Some("videos/V1/720p/playlist.m3u8")
        );
        assert_eq!(
            join_reference("videos/V1/480p/", "../720p/seg_001.ts?v=2").as_deref(),
            Some("videos/V1/720p/seg_001.ts")
        );
        assert_eq!(join_reference("videos/", "../../x.ts"), None);
        assert_eq!(join_reference("videos/V1/", "720p//x.ts"), None);
        assert_eq!(join_reference("videos/V1/", "/abs/x.ts"), None);
    }
}
