//! Protocol and delivery constants.

use std::time::Duration;

/// MIME type for HLS playlists (master and variant).
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Fallback MIME type for MPEG-TS segments when the object store reports none.
pub const DEFAULT_SEGMENT_CONTENT_TYPE: &str = "video/MP2T";

/// File extension every segment key must end with.
pub const DEFAULT_SEGMENT_EXTENSION: &str = ".ts";

/// File name of a variant playlist inside its quality directory.
pub const VARIANT_PLAYLIST_NAME: &str = "playlist.m3u8";

/// Key prefix of the processed-video family (`videos/{id}/{quality}/...`).
pub const DEFAULT_PROCESSED_PREFIX: &str = "videos";

/// Default lifetime of a signed URL.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Default `max-age` for playlist responses.
pub const DEFAULT_PLAYLIST_MAX_AGE_SECS: u64 = 3600;

/// Default `max-age` for segment responses.
pub const DEFAULT_SEGMENT_MAX_AGE_SECS: u64 = 86_400;

/// Length of a catalog identifier (24 hex characters, ObjectId shape).
pub const CATALOG_ID_LEN: usize = 24;

/// Route prefix of the catalog-backed proxy family.
pub const V1_ROUTE_PREFIX: &str = "/api/videos/v1";

/// Route prefix of the processed-video family.
pub const PROCESSED_ROUTE_PREFIX: &str = "/api/videos/processed";

/// Path segment under a v1 video that serves base-relative segment paths.
pub const PROXY_SEGMENT_ROUTE: &str = "proxy";

/// Route prefix shared by the signed families (`{prefix}/{id}/stream`, `{prefix}/{id}/hls`).
pub const VIDEOS_ROUTE_PREFIX: &str = "/api/videos";

/// Path segment under a video that serves the query-parameter route.
pub const UNIFIED_ROUTE: &str = "hls";
