//! Upstream call plumbing: transport, rate limiting and retry.
//!
//! The gateway composes these per call as
//! `RetryPolicy::run(|| { limiter.acquire(); transport.get(..) })`, so every
//! attempt, including retries, spends a rate-limit token.

pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use retry::{Classifier, RetryConfig, RetryDecision, RetryPolicy, classify};
pub use transport::{DEFAULT_BASE_URL, ReqwestTransport, Transport, UpstreamResponse};
