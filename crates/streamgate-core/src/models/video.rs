use serde::{Deserialize, Serialize};

/// A catalog video, read-only from the gateway's point of view.
///
/// `video_url` is the object-store key of the HLS master playlist, e.g.
/// `videos/64b7f0c2e4b0a1a2b3c4d5e6/master.m3u8`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub video_url: String,
    pub course_id: String,
    pub title: String,
    pub duration: Option<f64>,
    pub thumbnail_url: Option<String>,
}

impl VideoRecord {
    /// Everything in `video_url` up to and including the last `/`.
    ///
    /// Empty when the master playlist sits at the bucket root.
    pub fn base_prefix(&self) -> &str {
        match self.video_url.rfind('/') {
            Some(idx) => &self.video_url[..=idx],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(url: &str) -> VideoRecord {
        VideoRecord {
            id: "64b7f0c2e4b0a1a2b3c4d5e6".to_string(),
            video_url: url.to_string(),
            course_id: "course-1".to_string(),
            title: "Intro".to_string(),
            duration: Some(93.5),
            thumbnail_url: None,
        }
    }

    #[test]
    fn test_base_prefix_keeps_trailing_separator() {
        assert_eq!(video("videos/V1/master.m3u8").base_prefix(), "videos/V1/");
        assert_eq!(video("master.m3u8").base_prefix(), "");
    }

    #[test]
    fn test_deserialize_camel_case_seed() {
        let json = r#"{
            "id": "64b7f0c2e4b0a1a2b3c4d5e6",
            "videoUrl": "videos/V1/master.m3u8",
            "courseId": "c1",
            "title": "Lesson 1",
            "duration": null,
            "thumbnailUrl": "thumbs/V1.jpg"
        }"#;
        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.video_url, "videos/V1/master.m3u8");
        assert_eq!(record.thumbnail_url.as_deref(), Some("thumbs/V1.jpg"));
    }
}
