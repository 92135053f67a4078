//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers::{health, stream};
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use streamgate_core::constants::{PROCESSED_ROUTE_PREFIX, PROXY_SEGMENT_ROUTE, V1_ROUTE_PREFIX};
use streamgate_core::Config;
use streamgate_infra::{
    rate_limit_middleware, request_id_middleware, security_headers_middleware, spawn_sweeper,
    CounterStore, RateLimitState, RequestId, ShardedCounterStore,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Build the router with every route family, probe and middleware layer.
///
/// Starts the rate-limit sweeper; it stops when `state.shutdown` is cancelled.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let rate_limit = setup_rate_limiter(config, &state);

    let stream_routes = Router::new()
        .route("/api/videos/{video_id}/stream", get(stream::stream_master))
        .route("/api/videos/{video_id}/hls", get(stream::stream_hls))
        .route(
            &format!("{}/{{video_id}}/{{quality}}/{{file}}", PROCESSED_ROUTE_PREFIX),
            get(stream::processed_file),
        )
        .route(
            &format!("{}/{{video_id}}/master.m3u8", V1_ROUTE_PREFIX),
            get(stream::v1_master),
        )
        .route(
            &format!("{}/{{video_id}}/{{quality}}/{{file}}", V1_ROUTE_PREFIX),
            get(stream::v1_file),
        )
        .route(
            &format!(
                "{}/{{video_id}}/{}/{{*segment_path}}",
                V1_ROUTE_PREFIX, PROXY_SEGMENT_ROUTE
            ),
            get(stream::v1_proxy_segment),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    // Probes stay outside the rate limit
    let probe_routes = Router::new()
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check))
        .route("/health", get(health::health_check));

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        "HTTP concurrency limit layer enabled"
    );

    let app = stream_routes
        .merge(probe_routes)
        .with_state(state)
        .merge(RapiDoc::with_openapi("/api/openapi.json", ApiDoc::openapi()).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit().max(1)))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            config.is_production(),
            security_headers_middleware,
        ));

    Ok(app)
}

/// Request span carrying the id set by `request_id_middleware`, which runs first.
fn make_request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.as_str())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::HEAD, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn setup_rate_limiter(config: &Config, state: &AppState) -> RateLimitState {
    let store: Arc<dyn CounterStore> =
        Arc::new(ShardedCounterStore::new(config.rate_limiter_shard_count()));

    spawn_sweeper(
        store.clone(),
        config.rate_limit_sweep_interval(),
        state.shutdown.clone(),
    );

    tracing::info!(
        limit_per_minute = config.http_rate_limit_per_minute(),
        shard_count = config.rate_limiter_shard_count(),
        sweep_interval_secs = config.rate_limit_sweep_interval().as_secs(),
        "HTTP rate limiter enabled"
    );

    RateLimitState::per_minute(
        store,
        config.http_rate_limit_per_minute(),
        config.trusted_proxy_count(),
    )
}
