//! Streamgate Infrastructure Library
//!
//! Shared infrastructure for the gateway binary:
//! - Middleware (request ID, security headers)
//! - Tracing initialization
//! - Rate limiting (counter store, background sweep, HTTP middleware)

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{request_id_middleware, security_headers_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{
    rate_limit_middleware, spawn_sweeper, CounterStore, RateLimitState, ShardedCounterStore,
};
