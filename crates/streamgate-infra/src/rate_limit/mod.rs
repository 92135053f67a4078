//! HTTP rate limiting
//!
//! Counters live behind the [`CounterStore`] trait so a shared store can replace
//! the in-process [`ShardedCounterStore`] when the gateway runs as several replicas.
//! Expired counters are dropped by a background sweep started with [`spawn_sweeper`],
//! never on the request path.

mod ip;
mod middleware;
mod store;

pub use ip::extract_client_ip;
pub use middleware::{rate_limit_middleware, RateLimitState};
pub use store::{spawn_sweeper, CounterStore, ShardedCounterStore};
