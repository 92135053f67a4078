//! HLS stream handlers
//!
//! Each handler only maps its route onto a `StreamRequest`; the gateway does the
//! rest and the result is rendered by `into_http_response`.

use crate::error::{ErrorResponse, HttpAppError};
use crate::principal::Caller;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use serde::Deserialize;
use std::sync::Arc;
use streamgate_core::constants::{PLAYLIST_CONTENT_TYPE, VARIANT_PLAYLIST_NAME};
use streamgate_core::{AppError, RequestShape};
use streamgate_delivery::{GatewayResponse, RouteFamily, StreamRequest};
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HlsQuery {
    /// Quality rung, e.g. `720p`. Absent for the master playlist.
    pub resolution: Option<String>,
    /// Segment file name inside the quality directory.
    pub segment: Option<String>,
}

/// `{quality}/playlist.m3u8` is a variant playlist; any other file is a segment.
fn shape_for_file(quality: String, file: String) -> RequestShape {
    if file == VARIANT_PLAYLIST_NAME {
        RequestShape::Variant { quality }
    } else {
        RequestShape::Segment {
            quality: Some(quality),
            segment: file,
        }
    }
}

async fn serve(
    state: &AppState,
    family: RouteFamily,
    video_id: String,
    shape: RequestShape,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    let response = state
        .gateway
        .handle(StreamRequest {
            family,
            video_id,
            shape,
            principal: caller.0,
        })
        .await?;
    into_http_response(response)
}

fn into_http_response(response: GatewayResponse) -> Result<Response, HttpAppError> {
    let built = match response {
        GatewayResponse::Playlist { body, max_age_secs } => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE)
            .header(header::CACHE_CONTROL, format!("private, max-age={}", max_age_secs))
            .body(Body::from(body)),
        GatewayResponse::Segment {
            body,
            content_type,
            content_length,
            max_age_secs,
        } => {
            let content_type = HeaderValue::from_str(&content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            let mut builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CACHE_CONTROL, format!("public, max-age={}", max_age_secs))
                .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");
            if let Some(len) = content_length {
                builder = builder.header(header::CONTENT_LENGTH, len);
            }
            // Headers are already sent when a mid-stream failure happens; the
            // client sees a truncated body and the error is logged here
            let stream = body.inspect_err(|e| {
                tracing::error!(error = %e, "Segment stream failed mid-body");
            });
            builder.body(Body::from_stream(stream))
        }
        GatewayResponse::Redirect { location } => Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header(header::LOCATION, location)
            .header(header::CACHE_CONTROL, "no-store")
            .body(Body::empty()),
    };

    built.map_err(|e| {
        HttpAppError(AppError::Internal(format!("Failed to build response: {}", e)))
    })
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}/stream",
    tag = "stream",
    params(
        ("video_id" = String, Path, description = "Catalog identifier (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Master playlist whose variants point at the hls route", content_type = "application/vnd.apple.mpegurl"),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Video or playlist not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
pub async fn stream_master(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    serve(&state, RouteFamily::MasterStream, video_id, RequestShape::Master, caller).await
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}/hls",
    tag = "stream",
    params(
        ("video_id" = String, Path, description = "Catalog identifier (24 hex characters)"),
        HlsQuery
    ),
    responses(
        (status = 200, description = "Master or variant playlist, or segment bytes"),
        (status = 307, description = "Redirect to a signed segment URL"),
        (status = 400, description = "Malformed identifier, quality or segment", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
pub async fn stream_hls(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Query(query): Query<HlsQuery>,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    let shape = RequestShape::classify(query.resolution, query.segment);
    serve(&state, RouteFamily::UnifiedQuery, video_id, shape, caller).await
}

#[utoipa::path(
    get,
    path = "/api/videos/processed/{video_id}/{quality}/{file}",
    tag = "stream",
    params(
        ("video_id" = String, Path, description = "Processing job identifier"),
        ("quality" = String, Path, description = "Quality rung, e.g. 720p"),
        ("file" = String, Path, description = "`playlist.m3u8` or a segment file name")
    ),
    responses(
        (status = 200, description = "Variant playlist or segment bytes"),
        (status = 400, description = "Malformed quality or segment", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
pub async fn processed_file(
    State(state): State<Arc<AppState>>,
    Path((video_id, quality, file)): Path<(String, String, String)>,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    let shape = shape_for_file(quality, file);
    serve(&state, RouteFamily::Processed, video_id, shape, caller).await
}

#[utoipa::path(
    get,
    path = "/api/videos/v1/{video_id}/master.m3u8",
    tag = "stream",
    params(
        ("video_id" = String, Path, description = "Catalog identifier (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Master playlist with gateway-relative variant URLs", content_type = "application/vnd.apple.mpegurl"),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
pub async fn v1_master(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    serve(&state, RouteFamily::V1ProxyMaster, video_id, RequestShape::Master, caller).await
}

#[utoipa::path(
    get,
    path = "/api/videos/v1/{video_id}/{quality}/{file}",
    tag = "stream",
    params(
        ("video_id" = String, Path, description = "Catalog identifier (24 hex characters)"),
        ("quality" = String, Path, description = "Quality rung, e.g. 720p"),
        ("file" = String, Path, description = "`playlist.m3u8` or a segment file name")
    ),
    responses(
        (status = 200, description = "Variant playlist or segment bytes"),
        (status = 400, description = "Malformed identifier, quality or segment", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
pub async fn v1_file(
    State(state): State<Arc<AppState>>,
    Path((video_id, quality, file)): Path<(String, String, String)>,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    let shape = shape_for_file(quality, file);
    serve(&state, RouteFamily::V1, video_id, shape, caller).await
}

#[utoipa::path(
    get,
    path = "/api/videos/v1/{video_id}/proxy/{segment_path}",
    tag = "stream",
    params(
        ("video_id" = String, Path, description = "Catalog identifier (24 hex characters)"),
        ("segment_path" = String, Path, description = "Segment path relative to the video's directory")
    ),
    responses(
        (status = 200, description = "Segment bytes"),
        (status = 400, description = "Malformed identifier or segment path", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
pub async fn v1_proxy_segment(
    State(state): State<Arc<AppState>>,
    Path((video_id, segment_path)): Path<(String, String)>,
    caller: Caller,
) -> Result<Response, HttpAppError> {
    let shape = RequestShape::Segment {
        quality: None,
        segment: segment_path,
    };
    serve(&state, RouteFamily::V1ProxySegment, video_id, shape, caller).await
}
