//! Stream route integration tests.
//!
//! Run with: `cargo test -p streamgate-api --test stream_test`

mod helpers;

use async_trait::async_trait;
use axum::http::StatusCode;
use helpers::{setup_test_app, setup_test_app_with, test_config, JOB_ID, SEGMENT_BYTES, VIDEO_ID};
use serde_json::Value;
use std::sync::Arc;
use streamgate_core::{
    AccessDecision, AccessGate, AllowAll, AppError, DenyAll, Principal, SegmentDelivery,
    VideoRecord,
};

#[tokio::test]
async fn test_v1_master_rewrites_to_gateway_urls() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/master.m3u8", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.header("cache-control"), "private, max-age=3600");

    let body = response.text();
    assert!(body.contains(&format!("/api/videos/v1/{}/720p/playlist.m3u8\n", VIDEO_ID)));
    assert!(body.contains(&format!("/api/videos/v1/{}/480p/playlist.m3u8\n", VIDEO_ID)));
    // Tag lines are untouched
    assert!(body.contains("#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480\n"));
}

#[tokio::test]
async fn test_v1_variant_then_segment() {
    let app = setup_test_app();

    let playlist = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/playlist.m3u8", VIDEO_ID))
        .await;
    assert_eq!(playlist.status_code(), StatusCode::OK);

    let segment_url = playlist
        .text()
        .lines()
        .find(|l| l.ends_with("seg_001.ts"))
        .map(str::to_string)
        .expect("segment line");
    assert_eq!(
        segment_url,
        format!("/api/videos/v1/{}/480p/seg_001.ts", VIDEO_ID)
    );

    let segment = app.client().get(&segment_url).await;
    assert_eq!(segment.status_code(), StatusCode::OK);
    assert_eq!(segment.header("content-type"), "video/MP2T");
    assert_eq!(segment.header("access-control-allow-origin"), "*");
    assert_eq!(segment.header("cache-control"), "public, max-age=86400");
    assert_eq!(segment.as_bytes().as_ref(), SEGMENT_BYTES);

    assert!(app
        .storage
        .calls()
        .contains(&format!("get videos/{}/480p/seg_001.ts", VIDEO_ID)));
}

#[tokio::test]
async fn test_segment_requests_are_idempotent() {
    let app = setup_test_app();
    let url = format!("/api/videos/v1/{}/480p/seg_001.ts", VIDEO_ID);

    let first = app.client().get(&url).await;
    let second = app.client().get(&url).await;

    assert_eq!(first.as_bytes(), second.as_bytes());
    assert_eq!(first.header("content-type"), second.header("content-type"));
}

#[tokio::test]
async fn test_traversal_segment_is_rejected_without_storage_calls() {
    let app = setup_test_app();

    let unified = app
        .client()
        .get(&format!("/api/videos/{}/hls", VIDEO_ID))
        .add_query_param("resolution", "480p")
        .add_query_param("segment", "../../etc/passwd.ts")
        .await;
    assert_eq!(unified.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = unified.json();
    assert_eq!(body["code"], "INVALID_SEGMENT_PATH");

    // Encoded separators decode into the path parameter and hit the same guard
    let v1 = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/..%2F..%2Fetc%2Fpasswd.ts", VIDEO_ID))
        .await;
    assert_eq!(v1.status_code(), StatusCode::BAD_REQUEST);

    let proxy = app
        .client()
        .get(&format!("/api/videos/v1/{}/proxy/..%2F..%2Fetc%2Fpasswd.ts", VIDEO_ID))
        .await;
    assert_eq!(proxy.status_code(), StatusCode::BAD_REQUEST);

    assert_eq!(app.storage.call_count(), 0);
}

#[tokio::test]
async fn test_traversal_rejected_for_unknown_video() {
    let app = setup_test_app();

    let response = app
        .client()
        .get("/api/videos/ffffffffffffffffffffffff/hls")
        .add_query_param("resolution", "480p")
        .add_query_param("segment", "../../etc/passwd.ts")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.catalog.lookup_count(), 0);
}

#[tokio::test]
async fn test_wrong_extension_is_rejected() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/seg_001.mp4", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_SEGMENT_PATH");
    assert_eq!(app.storage.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_identifier_skips_catalog() {
    let app = setup_test_app();

    let response = app.client().get("/api/videos/not-an-id/stream").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_IDENTIFIER");
    assert_eq!(body["recoverable"], false);
    assert_eq!(app.catalog.lookup_count(), 0);
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let app = setup_test_app();

    let response = app
        .client()
        .get("/api/videos/ffffffffffffffffffffffff/stream")
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_segment_is_not_found() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/seg_999.ts", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_object_is_integrity_error() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/empty.ts", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_INTEGRITY_ERROR");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_unavailable_store_is_bad_gateway() {
    let app = setup_test_app();
    app.storage.set_unavailable(true);

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/seg_001.ts", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["recoverable"], true);
}

#[tokio::test]
async fn test_signed_master_leads_to_signed_segments() {
    let app = setup_test_app();

    let master = app
        .client()
        .get(&format!("/api/videos/{}/stream", VIDEO_ID))
        .await;
    assert_eq!(master.status_code(), StatusCode::OK);
    let master = master.text();
    assert!(master.contains(&format!("\n/api/videos/{}/hls?resolution=480p\n", VIDEO_ID)));
    assert!(!master.contains("memory://"));
    assert!(!app.storage.calls().iter().any(|c| c.starts_with("presign")));

    // Follow the first variant reference the way a player would
    let variant_url = master
        .lines()
        .find(|line| !line.starts_with('#'))
        .unwrap();
    let (path, query) = variant_url.split_once('?').unwrap();
    let (name, value) = query.split_once('=').unwrap();
    let variant = app.client().get(path).add_query_param(name, value).await;
    assert_eq!(variant.status_code(), StatusCode::OK);

    let segment_url = variant
        .text()
        .lines()
        .find(|line| !line.starts_with('#'))
        .map(str::to_string)
        .unwrap();
    assert_eq!(
        segment_url,
        format!("memory:///videos/{}/480p/seg_001.ts?expires_in=3600", VIDEO_ID)
    );
    assert!(app
        .storage
        .calls()
        .contains(&format!("presign videos/{}/480p/seg_001.ts", VIDEO_ID)));
}

#[tokio::test]
async fn test_signing_failure_returns_no_partial_playlist() {
    let app = setup_test_app();
    app.storage.fail_signing(true);

    let response = app
        .client()
        .get(&format!("/api/videos/{}/hls", VIDEO_ID))
        .add_query_param("resolution", "480p")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert!(!response.text().contains("#EXTM3U"));
}

#[tokio::test]
async fn test_unified_route_dispatches_by_query() {
    let app = setup_test_app();
    let path = format!("/api/videos/{}/hls", VIDEO_ID);

    let master = app.client().get(&path).await;
    assert_eq!(master.status_code(), StatusCode::OK);
    assert!(master
        .text()
        .contains(&format!("/api/videos/{}/hls?resolution=480p", VIDEO_ID)));

    let variant = app
        .client()
        .get(&path)
        .add_query_param("resolution", "480p")
        .await;
    assert_eq!(variant.status_code(), StatusCode::OK);
    assert!(variant.text().contains("480p/seg_001.ts?expires_in="));

    let segment = app
        .client()
        .get(&path)
        .add_query_param("resolution", "480p")
        .add_query_param("segment", "seg_001.ts")
        .await;
    assert_eq!(segment.status_code(), StatusCode::OK);
    assert_eq!(segment.as_bytes().as_ref(), SEGMENT_BYTES);

    let orphan = app
        .client()
        .get(&path)
        .add_query_param("segment", "seg_001.ts")
        .await;
    assert_eq!(orphan.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redirect_mode_answers_with_signed_location() {
    let mut config = test_config();
    config.segment_delivery = SegmentDelivery::Redirect;
    let app = setup_test_app_with(config, Arc::new(AllowAll));

    let response = app
        .client()
        .get(&format!("/api/videos/{}/hls", VIDEO_ID))
        .add_query_param("resolution", "480p")
        .add_query_param("segment", "seg_001.ts")
        .await;

    assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.header("location"),
        format!("memory:///videos/{}/480p/seg_001.ts?expires_in=3600", VIDEO_ID).as_str()
    );
    assert!(!app.storage.calls().iter().any(|c| c.starts_with("get ")));
}

#[tokio::test]
async fn test_quality_allow_list() {
    let mut config = test_config();
    config.allowed_qualities = vec!["480p".to_string()];
    let app = setup_test_app_with(config, Arc::new(AllowAll));

    let allowed = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/playlist.m3u8", VIDEO_ID))
        .await;
    assert_eq!(allowed.status_code(), StatusCode::OK);

    let refused = app
        .client()
        .get(&format!("/api/videos/v1/{}/1080p/playlist.m3u8", VIDEO_ID))
        .await;
    assert_eq!(refused.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = refused.json();
    assert_eq!(body["code"], "INVALID_QUALITY");
}

#[tokio::test]
async fn test_processed_route_accepts_non_catalog_ids() {
    let app = setup_test_app();

    let playlist = app
        .client()
        .get(&format!("/api/videos/processed/{}/360p/playlist.m3u8", JOB_ID))
        .await;
    assert_eq!(playlist.status_code(), StatusCode::OK);
    assert!(playlist.text().contains(&format!(
        "/api/videos/processed/{}/360p/seg_000.ts",
        JOB_ID
    )));

    let segment = app
        .client()
        .get(&format!("/api/videos/processed/{}/360p/seg_000.ts", JOB_ID))
        .await;
    assert_eq!(segment.status_code(), StatusCode::OK);
    assert_eq!(segment.text(), "JOB-SEGMENT");

    // No catalog involvement for this family
    assert_eq!(app.catalog.lookup_count(), 0);
}

#[tokio::test]
async fn test_processed_id_with_reserved_characters_round_trips() {
    let app = setup_test_app();
    app.storage
        .insert("videos/job 7#b/360p/playlist.m3u8", "#EXTM3U\nseg_000.ts\n", None);
    app.storage
        .insert("videos/job 7#b/360p/seg_000.ts", "JOB-7B", Some("video/MP2T"));

    let playlist = app
        .client()
        .get("/api/videos/processed/job%207%23b/360p/playlist.m3u8")
        .await;
    assert_eq!(playlist.status_code(), StatusCode::OK);
    let segment_path = playlist
        .text()
        .lines()
        .last()
        .map(str::to_string)
        .unwrap();
    assert_eq!(segment_path, "/api/videos/processed/job%207%23b/360p/seg_000.ts");

    let segment = app.client().get(&segment_path).await;
    assert_eq!(segment.status_code(), StatusCode::OK);
    assert_eq!(segment.text(), "JOB-7B");
}

#[tokio::test]
async fn test_v1_proxy_segment_route() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/proxy/480p/seg_001.ts", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), SEGMENT_BYTES);
}

#[tokio::test]
async fn test_denied_access_is_forbidden() {
    let app = setup_test_app_with(test_config(), Arc::new(DenyAll));

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/480p/seg_001.ts", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(app.storage.call_count(), 0);
}

/// Lets only named subjects in.
struct SubjectGate;

#[async_trait]
impl AccessGate for SubjectGate {
    async fn check(
        &self,
        principal: &Principal,
        _video: &VideoRecord,
    ) -> Result<AccessDecision, AppError> {
        Ok(if principal.is_anonymous() {
            AccessDecision::deny("sign in to watch")
        } else {
            AccessDecision::allow()
        })
    }
}

#[tokio::test]
async fn test_anonymous_caller_reaches_gate_as_anonymous() {
    let app = setup_test_app_with(test_config(), Arc::new(SubjectGate));

    let response = app
        .client()
        .get(&format!("/api/videos/v1/{}/master.m3u8", VIDEO_ID))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
