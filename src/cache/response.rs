//! Response cache for upstream documents.
//!
//! [`ResponseCache`] stores raw upstream JSON documents keyed on a
//! [`CacheKey`]. Every entry carries its insertion time; an entry older than
//! the TTL is treated as absent. Size is bounded: inserting past
//! `max_size` evicts in strict least-recently-used order, where "used"
//! means the last successful `get` or `set`.
//!
//! # Counters
//!
//! Hits, misses, evictions and expirations are counted inside the same
//! critical section as the operation that causes them. An expired entry
//! found by `get` counts as one expiration *and* one miss. Evictions (size
//! pressure) and expirations (age) are never conflated.
//!
//! # Concurrency
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Two concurrent misses on the same key may both fetch upstream
//! and both `set`; the last write wins. Responses are idempotent, so this
//! is accepted.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use super::key::CacheKey;
use crate::telemetry;

/// Configuration for the response cache.
///
/// ```rust
/// # use cinegate::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_size(5_000)
///     .ttl(Duration::from_secs(30 * 60));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries. Default: 1,000.
    pub max_size: usize,
    /// Time-to-live for cached entries. Default: 60 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1_000,
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_size(mut self, n: usize) -> Self {
        self.max_size = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub cache_size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses) * 100`, rounded to 2 decimals; 0 before any lookup.
    pub hit_rate_percent: f64,
    pub evictions: u64,
    pub expirations: u64,
    pub ttl_minutes: f64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// In-memory TTL + LRU cache of upstream documents.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_size: usize,
}

impl ResponseCache {
    /// Create an empty cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                // Bounded by hand in `set` so each eviction is counted.
                entries: LruCache::unbounded(),
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            ttl: config.ttl,
            max_size: config.max_size,
        }
    }

    // Counters stay consistent even if a holder panicked, so poisoning is ignored.
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) > self.ttl
    }

    /// Look up a live entry, refreshing its recency on hit.
    ///
    /// An expired entry is removed here and counted as an expiration and a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        let mut state = self.state();

        match state.entries.peek(key).map(|entry| self.is_expired(entry, now)) {
            None => {
                state.misses += 1;
                drop(state);
                debug!(key = key.short(), "cache miss");
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                return None;
            }
            Some(true) => {
                state.entries.pop(key);
                state.expirations += 1;
                state.misses += 1;
                drop(state);
                debug!(key = key.short(), "cache entry expired");
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                return None;
            }
            Some(false) => {}
        }

        let value = state.entries.get(key).map(|entry| entry.value.clone());
        state.hits += 1;
        drop(state);
        debug!(key = key.short(), "cache hit");
        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        value
    }

    /// Insert or replace an entry, then evict LRU entries down to `max_size`.
    pub fn set(&self, key: CacheKey, value: Value) {
        let mut state = self.state();
        // Replacement is delete-then-insert so the entry gets a fresh timestamp and position.
        state.entries.pop(&key);
        state.entries.put(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );

        let mut evicted = 0u64;
        while state.entries.len() > self.max_size {
            match state.entries.pop_lru() {
                Some((old, _)) => {
                    evicted += 1;
                    debug!(key = old.short(), "cache evicted");
                }
                None => break,
            }
        }
        state.evictions += evicted;
        drop(state);

        if evicted > 0 {
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(evicted);
        }
    }

    /// Whether `key` has a live entry. Does not touch recency or counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        let state = self.state();
        state
            .entries
            .peek(key)
            .is_some_and(|entry| !self.is_expired(entry, now))
    }

    /// Drop every entry. Returns how many were removed.
    ///
    /// Counters are kept; only the contents go.
    pub fn clear(&self) -> usize {
        let mut state = self.state();
        let removed = state.entries.len();
        state.entries.clear();
        drop(state);
        info!(removed, "cache cleared");
        removed
    }

    /// Remove all expired entries without waiting for them to be read.
    ///
    /// Each removal counts as an expiration. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state();
        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.entries.pop(key);
        }
        state.expirations += expired.len() as u64;
        drop(state);

        if !expired.is_empty() {
            debug!(removed = expired.len(), "cleaned up expired cache entries");
        }
        expired.len()
    }

    /// Number of entries currently stored (expired-but-unread ones included).
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of counters and size.
    pub fn stats(&self) -> CacheStats {
        let state = self.state();
        let lookups = state.hits + state.misses;
        let hit_rate_percent = if lookups == 0 {
            0.0
        } else {
            round2(state.hits as f64 / lookups as f64 * 100.0)
        };
        CacheStats {
            cache_size: state.entries.len(),
            max_size: self.max_size,
            hits: state.hits,
            misses: state.misses,
            hit_rate_percent,
            evictions: state.evictions,
            expirations: state.expirations,
            ttl_minutes: self.ttl.as_secs_f64() / 60.0,
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
