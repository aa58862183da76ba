//! Fixed-window rate limiter
//!
//! Each identifier gets a counter and a reset instant. The first request opens a
//! window of `window` length; requests inside it count up to `max_requests`, after
//! which they are refused until the window closes. A request arriving at or after the
//! reset instant starts a new window with a count of one.
//!
//! State is process-local and bounded: once a shard is full, expired windows are
//! dropped first. If that frees nothing, the least recently seen identifier that is
//! still under its limit is evicted; identifiers at their limit go only when every
//! tracked identifier is limited, so a flood of fresh keys cannot reset them.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const DEFAULT_SHARD_COUNT: usize = 16;

#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_at: Instant,
    last_seen: Instant,
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32, reset_in: Duration },
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Whole seconds to wait, rounded up and never zero.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateLimitDecision::Limited { retry_after } => {
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                Some(secs.max(1))
            }
            RateLimitDecision::Allowed { .. } => None,
        }
    }
}

/// Sharded fixed-window limiter shared by all requests of the process.
#[derive(Debug)]
pub struct RateLimiter {
    shards: Vec<Mutex<HashMap<String, RateLimitRecord>>>,
    max_requests: u32,
    window: Duration,
    max_entries_per_shard: usize,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_entries: usize) -> Self {
        Self::with_shards(max_requests, window, max_entries, DEFAULT_SHARD_COUNT)
    }

    pub fn with_shards(
        max_requests: u32,
        window: Duration,
        max_entries: usize,
        shard_count: usize,
    ) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            shards,
            max_requests: max_requests.max(1),
            window,
            max_entries_per_shard: max_entries.max(1).div_ceil(shard_count),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn shard_for(&self, key: &str) -> &Mutex<HashMap<String, RateLimitRecord>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now()).await
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub async fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut records = self.shard_for(key).lock().await;

        if !records.contains_key(key) && records.len() >= self.max_entries_per_shard {
            self.make_room(&mut records, now);
        }

        let window = self.window;
        let record = records.entry(key.to_string()).or_insert(RateLimitRecord {
            count: 0,
            reset_at: now + window,
            last_seen: now,
        });
        record.last_seen = now;

        if now >= record.reset_at {
            record.count = 0;
            record.reset_at = now + window;
        }

        if record.count >= self.max_requests {
            return RateLimitDecision::Limited {
                retry_after: record.reset_at.saturating_duration_since(now),
            };
        }

        record.count += 1;
        RateLimitDecision::Allowed {
            remaining: self.max_requests - record.count,
            reset_in: record.reset_at.saturating_duration_since(now),
        }
    }

    fn make_room(&self, records: &mut HashMap<String, RateLimitRecord>, now: Instant) {
        records.retain(|_, record| record.reset_at > now);

        if records.len() >= self.max_entries_per_shard {
            let max_requests = self.max_requests;
            let victim = records
                .iter()
                .min_by_key(|(_, record)| (record.count >= max_requests, record.last_seen))
                .map(|(key, _)| key.clone());
            if let Some(key) = victim {
                records.remove(&key);
                tracing::debug!(evicted_key = %key, "Rate limit shard full, evicted least recent window");
            }
        }
    }

    /// Drops every window that has already closed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            let mut records = shard.lock().await;
            let before = records.len();
            records.retain(|_, record| record.reset_at > now);
            removed += before - records.len();
        }
        if removed > 0 {
            tracing::debug!(windows_removed = removed, "Cleaned up expired rate limit windows");
        }
        removed
    }

    /// Number of identifiers currently tracked.
    pub async fn tracked(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }

    /// Runs [`cleanup_expired`](Self::cleanup_expired) every `every` until the runtime stops.
    pub fn spawn_cleanup(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.cleanup_expired().await;
            }
        })
    }
}
