//! Telemetry metric name constants.
//!
//! Centralised metric names for cinegate operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `cinegate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint`: logical upstream endpoint (e.g. "search", "movie", "tv_season")
//! - `status`: "ok" or "error"
//! - `cached`: "true" when the response came from the cache

/// Total upstream resources requested through the gateway (hits included).
///
/// Labels: `endpoint`, `status` ("ok" | "error"), `cached`.
pub const REQUESTS_TOTAL: &str = "cinegate_requests_total";

/// Request duration in seconds, measured around cache lookup and fetch.
///
/// Labels: `endpoint`.
pub const REQUEST_DURATION_SECONDS: &str = "cinegate_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `endpoint`, `reason` ("rate_limited" | "unavailable").
pub const RETRIES_TOTAL: &str = "cinegate_retries_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "cinegate_cache_hits_total";

/// Total response cache misses (expired entries included).
pub const CACHE_MISSES_TOTAL: &str = "cinegate_cache_misses_total";

/// Total entries evicted from the response cache for size.
pub const CACHE_EVICTIONS_TOTAL: &str = "cinegate_cache_evictions_total";

/// Total `acquire()` calls that had to wait for a rate-limit token.
pub const RATE_LIMIT_WAITS_TOTAL: &str = "cinegate_rate_limit_waits_total";
