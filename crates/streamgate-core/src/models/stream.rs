use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AppError;

/// Key of one blob in the object store: a master playlist, a variant playlist or a segment.
///
/// Keys never contain a `..` segment and never start with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Result<Self, AppError> {
        let key = key.into();
        if key.is_empty() {
            return Err(AppError::invalid_segment_path("empty object key"));
        }
        if key.starts_with('/') || key.contains('\\') || key.split('/').any(|part| part == "..") {
            return Err(AppError::invalid_segment_path(key));
        }
        Ok(ObjectKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Portion of the key up to and including the last `/`.
    pub fn dirname(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..=idx],
            None => "",
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A time-limited URL granting read access to exactly one key.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// What an inbound stream request asks for, decided by which parameters are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestShape {
    Master,
    Variant {
        quality: String,
    },
    /// `quality` is absent when the segment is addressed by a path relative to
    /// the video's base directory (the v1 proxy segment route).
    Segment {
        quality: Option<String>,
        segment: String,
    },
}

impl RequestShape {
    /// Empty quality values count as absent; an empty segment is kept so that
    /// validation can reject it.
    pub fn classify(quality: Option<String>, segment: Option<String>) -> Self {
        let quality = quality.filter(|q| !q.is_empty());
        match (quality, segment) {
            (None, None) => RequestShape::Master,
            (Some(quality), None) => RequestShape::Variant { quality },
            (quality, Some(segment)) => RequestShape::Segment { quality, segment },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestShape::Master => "master",
            RequestShape::Variant { .. } => "variant",
            RequestShape::Segment { .. } => "segment",
        }
    }
}

/// The caller as seen by the access gate.
///
/// An authentication layer in front of the gateway inserts this into the request
/// extensions; requests without one are anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub subject: Option<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self { subject: None }
    }

    pub fn user(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_rejects_traversal() {
        assert!(ObjectKey::new("videos/V1/../../etc/passwd.ts").is_err());
        assert!(ObjectKey::new("/etc/passwd").is_err());
        assert!(ObjectKey::new("").is_err());
        // `..` inside a file name is not a traversal segment
        assert!(ObjectKey::new("videos/V1/seg..1.ts").is_ok());
    }

    #[test]
    fn test_object_key_dirname() {
        let key = ObjectKey::new("videos/V1/480p/playlist.m3u8").unwrap();
        assert_eq!(key.dirname(), "videos/V1/480p/");
        assert_eq!(ObjectKey::new("master.m3u8").unwrap().dirname(), "");
    }

    #[test]
    fn test_classify_by_present_params() {
        assert_eq!(RequestShape::classify(None, None), RequestShape::Master);
        assert_eq!(
            RequestShape::classify(Some("720p".into()), None),
            RequestShape::Variant {
                quality: "720p".into()
            }
        );
        assert_eq!(
            RequestShape::classify(Some("720p".into()), Some("seg_001.ts".into())),
            RequestShape::Segment {
                quality: Some("720p".into()),
                segment: "seg_001.ts".into()
            }
        );
        assert_eq!(
            RequestShape::classify(Some(String::new()), None),
            RequestShape::Master
        );
    }
}
