use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use streamgate_core::Principal;

use super::ip::extract_client_ip;
use super::store::CounterStore;

/// Shared state of [`rate_limit_middleware`].
#[derive(Clone)]
pub struct RateLimitState {
    pub store: Arc<dyn CounterStore>,
    pub limit: u32,
    pub window: Duration,
    pub trusted_proxy_count: usize,
}

impl RateLimitState {
    /// Per-minute limit, the unit requests are configured in.
    pub fn per_minute(store: Arc<dyn CounterStore>, limit: u32, trusted_proxy_count: usize) -> Self {
        Self {
            store,
            limit,
            window: Duration::from_secs(60),
            trusted_proxy_count,
        }
    }
}

/// Counter key for a request: the authenticated subject when there is one,
/// otherwise the client address.
fn rate_limit_key(request: &Request, trusted_proxy_count: usize) -> String {
    if let Some(subject) = request
        .extensions()
        .get::<Principal>()
        .and_then(|p| p.subject.as_deref())
    {
        return format!("principal:{}", subject);
    }

    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = extract_client_ip(request.headers(), socket_addr.as_ref(), trusted_proxy_count);
    format!("ip:{}", ip)
}

/// HTTP rate limiting middleware
///
/// Adds `X-RateLimit-Limit` and `X-RateLimit-Remaining` to admitted responses.
/// Refused requests get `429 Too Many Requests` with `Retry-After` and the
/// usual JSON error body.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = rate_limit_key(&request, state.trusted_proxy_count);

    match state.store.increment(&key, state.limit, state.window).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(state.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        Err(reset_in) => {
            let retry_after = reset_in.as_secs().max(1);
            tracing::warn!(
                key = %key,
                path = %request.uri().path(),
                retry_after_secs = retry_after,
                "Rate limit exceeded"
            );

            let body = Json(serde_json::json!({
                "error": "Too many requests",
                "code": "RATE_LIMITED",
                "recoverable": true,
                "suggested_action": "Retry after the indicated delay",
            }));
            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            let headers = response.headers_mut();
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            headers.insert("X-RateLimit-Limit", HeaderValue::from(state.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::ShardedCounterStore;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(limit: u32) -> Router {
        let state = RateLimitState::per_minute(Arc::new(ShardedCounterStore::new(2)), limit, 1);
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
    }

    fn request_from(ip: &str) -> Request {
        axum::http::Request::builder()
            .uri("/")
            .header("x-real-ip", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_admits_then_refuses() {
        let app = app(2);

        let first = app.clone().oneshot(request_from("203.0.113.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers().get("X-RateLimit-Limit").unwrap(), "2");
        assert_eq!(first.headers().get("X-RateLimit-Remaining").unwrap(), "1");

        app.clone().oneshot(request_from("203.0.113.1")).await.unwrap();

        let refused = app.clone().oneshot(request_from("203.0.113.1")).await.unwrap();
        assert_eq!(refused.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(refused.headers().get("Retry-After").is_some());

        // Another client still gets through
        let other = app.oneshot(request_from("203.0.113.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_principal_keys_over_ip() {
        let mut request = request_from("203.0.113.1");
        request.extensions_mut().insert(Principal::user("alice"));
        assert_eq!(rate_limit_key(&request, 1), "principal:alice");

        let anonymous = request_from("203.0.113.1");
        assert_eq!(rate_limit_key(&anonymous, 1), "ip:203.0.113.1");
    }
}
