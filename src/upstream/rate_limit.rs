//! Token-bucket gate for outbound upstream calls.
//!
//! TMDB allows 40 requests per 10 seconds, so the defaults are a refill
//! rate of 4 tokens/second with a burst of 40. The bucket starts full.
//!
//! All refill and consume arithmetic, including the wait for a missing
//! token, happens while holding one `tokio::sync::Mutex`. Waiters queue
//! behind the lock (tokio's mutex is fair), so two callers can never spend
//! the same token.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;

/// Configuration for the upstream rate limiter.
///
/// ```rust
/// # use cinegate::RateLimitConfig;
/// let config = RateLimitConfig::new()
///     .requests_per_second(2.0)
///     .burst_limit(10);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Tokens added per second. Default: 4.0.
    pub requests_per_second: f64,
    /// Bucket capacity and initial balance. Default: 40.
    pub burst_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 4.0,
            burst_limit: 40,
        }
    }
}

impl RateLimitConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refill rate in tokens per second.
    pub fn requests_per_second(mut self, rate: f64) -> Self {
        self.requests_per_second = rate;
        self
    }

    /// Set the bucket capacity.
    pub fn burst_limit(mut self, limit: u32) -> Self {
        self.burst_limit = limit;
        self
    }
}

#[derive(Debug)]
struct RateBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter shared by every upstream call of a gateway.
pub struct RateLimiter {
    bucket: Mutex<RateBucket>,
    rate: f64,
    burst: f64,
}

impl RateLimiter {
    /// Create a limiter with a full bucket.
    ///
    /// A non-positive rate is clamped to a tiny positive value so `acquire`
    /// still terminates.
    pub fn new(config: &RateLimitConfig) -> Self {
        let burst = f64::from(config.burst_limit);
        Self {
            bucket: Mutex::new(RateBucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
            rate: config.requests_per_second.max(f64::EPSILON),
            burst,
        }
    }

    /// Take one token, waiting for the bucket to refill if it is empty.
    ///
    /// Never fails; only delays.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return;
        }

        let wait = Duration::from_secs_f64((1.0 - bucket.tokens) / self.rate);
        debug!(wait_ms = wait.as_millis() as u64, "rate limiting upstream call");
        metrics::counter!(telemetry::RATE_LIMIT_WAITS_TOTAL).increment(1);
        tokio::time::sleep(wait).await;

        // The token accrued during the wait is spent by this caller.
        bucket.tokens = 0.0;
        bucket.last_refill = Instant::now();
    }

    /// Token balance as of now, including refill since the last `acquire`.
    ///
    /// Read-only: the bucket itself is not updated.
    pub async fn available_tokens(&self) -> f64 {
        let bucket = self.bucket.lock().await;
        let elapsed = Instant::now()
            .saturating_duration_since(bucket.last_refill)
            .as_secs_f64();
        (bucket.tokens + elapsed * self.rate).min(self.burst)
    }
}
