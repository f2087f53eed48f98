use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: Instant,
    pub ttl: Duration,
    seq: u64,
}

impl CacheEntry {
    pub fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub expired: usize,
    pub evicted: usize,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    next_seq: u64,
}

impl Entries {
    /// Drops the oldest entries (by `stored_at`, then insertion order) above `max_size`.
    fn evict_overflow(&mut self, max_size: usize) -> usize {
        let excess = self.map.len().saturating_sub(max_size);
        if excess == 0 {
            return 0;
        }
        let mut by_age: Vec<(Instant, u64, String)> = self
            .map
            .iter()
            .map(|(key, entry)| (entry.stored_at, entry.seq, key.clone()))
            .collect();
        by_age.sort();
        for (_, _, key) in by_age.into_iter().take(excess) {
            self.map.remove(&key);
        }
        excess
    }
}

/// TTL cache of successful responses, bounded to `max_size` entries.
pub struct ResponseCache {
    entries: Mutex<Entries>,
    max_size: usize,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            max_size,
            default_ttl,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.map.get(key) {
            Some(entry) if entry.is_valid(now) => Some(entry.data.clone()),
            Some(_) => {
                entries.map.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, key: impl Into<String>, data: Value, ttl: Option<Duration>) {
        let mut entries = self.entries.lock().await;
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
                seq,
            },
        );
        entries.evict_overflow(self.max_size);
    }

    /// Without a pattern clears everything; otherwise removes every key containing it.
    /// Returns how many entries were removed.
    pub async fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.map.len();
        match pattern {
            None => entries.map.clear(),
            Some(pattern) => entries.map.retain(|key, _| !key.contains(pattern)),
        }
        let removed = before - entries.map.len();
        debug!(pattern = ?pattern, removed, "cache.invalidate");
        removed
    }

    pub async fn sweep(&self) -> SweepStats {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.map.len();
        entries.map.retain(|_, entry| entry.is_valid(now));
        let expired = before - entries.map.len();
        let evicted = entries.evict_overflow(self.max_size);
        if expired > 0 || evicted > 0 {
            debug!(expired, evicted, remaining = entries.map.len(), "cache.sweep");
        }
        SweepStats { expired, evicted }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.map.contains_key(key)
    }

    /// Sweeps `cache` every `every` until the handle is dropped or the cache is gone.
    /// A zero period is raised to one millisecond.
    pub fn spawn_sweeper(cache: &Arc<ResponseCache>, every: Duration) -> SweeperHandle {
        let weak: Weak<ResponseCache> = Arc::downgrade(cache);
        let every = every.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.sweep().await;
            }
        });
        SweeperHandle(task)
    }
}

/// Aborts the background sweep when dropped.
#[derive(Debug)]
pub struct SweeperHandle(JoinHandle<()>);

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}
