//! Test helpers: build the real router over in-memory collaborators.
//!
//! Run from workspace root: `cargo test -p streamgate-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use std::sync::Arc;
use streamgate_api::setup::routes;
use streamgate_api::state::AppState;
use streamgate_core::{
    AccessGate, AllowAll, CatalogBackend, Config, GatewayConfig, StorageBackend, VideoRecord,
};
use streamgate_db::InMemoryCatalog;
use streamgate_delivery::{DeliverySettings, Gateway};
use streamgate_storage::MemoryStorage;
use tokio_util::sync::CancellationToken;

/// A catalog identifier in the expected 24-hex-character format.
pub const VIDEO_ID: &str = "64b7f0c2e4b0a1a2b3c4d5e6";

/// A processing job identifier that is not catalog-shaped.
pub const JOB_ID: &str = "job_2024-05-01.batch7";

pub const SEGMENT_BYTES: &[u8] = b"\x47\x40\x11\x10SEGMENT-480-001";

pub const MASTER: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480\n\
480p/playlist.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720\n\
720p/playlist.m3u8\n";

pub const VARIANT_480: &str = "#EXTM3U\n\
#EXT-X-TARGETDURATION:6\n\
#EXTINF:6.0,\n\
seg_001.ts\n\
#EXTINF:6.0,\n\
seg_002.ts\n\
#EXT-X-ENDLIST\n";

pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryStorage>,
    pub catalog: Arc<InMemoryCatalog>,
    pub shutdown: CancellationToken,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Memory catalog and memory object store, everything else at defaults.
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        storage_backend: StorageBackend::Memory,
        catalog_backend: CatalogBackend::Memory,
        ..Default::default()
    }
}

pub fn video_record() -> VideoRecord {
    VideoRecord {
        id: VIDEO_ID.to_string(),
        video_url: format!("videos/{}/master.m3u8", VIDEO_ID),
        course_id: "course-42".to_string(),
        title: "Lesson 1".to_string(),
        duration: Some(12.0),
        thumbnail_url: None,
    }
}

/// Object store seeded with one catalog video and one processed job.
pub fn seeded_storage() -> MemoryStorage {
    let base = format!("videos/{}", VIDEO_ID);
    MemoryStorage::new()
        .with_object(&format!("{}/master.m3u8", base), MASTER)
        .with_object(&format!("{}/480p/playlist.m3u8", base), VARIANT_480)
        .with_object(&format!("{}/480p/seg_001.ts", base), SEGMENT_BYTES)
        .with_object(&format!("{}/480p/empty.ts", base), Vec::<u8>::new())
        .with_object(
            &format!("videos/{}/360p/playlist.m3u8", JOB_ID),
            "#EXTM3U\n#EXTINF:4.0,\nseg_000.ts\n",
        )
        .with_object(&format!("videos/{}/360p/seg_000.ts", JOB_ID), "JOB-SEGMENT")
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config(), Arc::new(AllowAll))
}

pub fn setup_test_app_with(config: GatewayConfig, access: Arc<dyn AccessGate>) -> TestApp {
    let config = Config::new(config);
    let storage = Arc::new(seeded_storage());
    let catalog = Arc::new(InMemoryCatalog::with_videos([video_record()]));
    let shutdown = CancellationToken::new();

    let gateway = Gateway::new(
        catalog.clone(),
        access,
        storage.clone(),
        DeliverySettings::from_config(&config),
    );
    let state = Arc::new(AppState {
        config: config.clone(),
        gateway,
        catalog: catalog.clone(),
        storage: storage.clone(),
        shutdown: shutdown.clone(),
    });

    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        storage,
        catalog,
        shutdown,
    }
}
