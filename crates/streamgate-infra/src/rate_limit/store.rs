use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fixed-window request counters keyed by caller.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one request for `key`.
    ///
    /// Returns the requests left in the current window, or how long until the
    /// window resets when the limit is already used up.
    async fn increment(&self, key: &str, limit: u32, window: Duration) -> Result<u32, Duration>;

    /// Drop counters whose window has expired. Returns how many were removed.
    async fn sweep_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

impl Bucket {
    fn new(window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + window,
        }
    }

    fn check_and_increment(&mut self, limit: u32, window: Duration) -> Result<u32, Duration> {
        let now = Instant::now();

        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + window;
        }

        if self.count < limit {
            self.count += 1;
            Ok(limit.saturating_sub(self.count))
        } else {
            Err(self.reset_at.saturating_duration_since(now))
        }
    }
}

/// In-process counter store.
///
/// Keys are hashed onto independent shards, each behind its own mutex, so
/// concurrent callers rarely contend for the same lock.
pub struct ShardedCounterStore {
    shards: Vec<Mutex<HashMap<String, Bucket>>>,
}

impl ShardedCounterStore {
    /// `shard_count` of zero is treated as one.
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self { shards }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of live counters across all shards.
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CounterStore for ShardedCounterStore {
    async fn increment(&self, key: &str, limit: u32, window: Duration) -> Result<u32, Duration> {
        let mut buckets = self.shards[self.shard_index(key)].lock().await;
        buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(window))
            .check_and_increment(limit, window)
    }

    async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            let mut buckets = shard.lock().await;
            let before = buckets.len();
            buckets.retain(|_, bucket| bucket.reset_at > now);
            removed += before - buckets.len();
        }
        removed
    }
}

/// Run `store.sweep_expired()` every `interval` until `shutdown` is cancelled.
pub fn spawn_sweeper(
    store: Arc<dyn CounterStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    // tokio panics on a zero period
    let interval = interval.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Rate limit sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.sweep_expired().await;
                    if removed > 0 {
                        tracing::debug!(buckets_removed = removed, "Swept expired rate limit buckets");
                    }
                }
            }
        }
    })
}
