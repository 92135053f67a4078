//! OpenAPI document, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Streamgate API",
        version = "0.1.0",
        description = "HLS delivery gateway: rewrites master playlists to point at gateway variant routes, rewrites variant playlists to signed object-store URLs or gateway segment routes, and proxies segments out of the object store."
    ),
    paths(
        handlers::stream::stream_master,
        handlers::stream::stream_hls,
        handlers::stream::processed_file,
        handlers::stream::v1_master,
        handlers::stream::v1_file,
        handlers::stream::v1_proxy_segment,
        handlers::health::liveness_check,
        handlers::health::readiness_check,
        handlers::health::health_check,
    ),
    components(schemas(error::ErrorResponse, handlers::health::HealthCheckResponse)),
    tags(
        (name = "stream", description = "HLS playlists and segments"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;
