//! Retry configuration, failure classification and the retry loop.
//!
//! [`RetryPolicy`] wraps a single upstream call. After each failure a
//! [`Classifier`] decides whether to try again and how long to wait first.
//! The default classifier, [`classify`], implements the upstream schedule:
//!
//! | Failure | Decision |
//! |---|---|
//! | `InvalidCredential`, `Forbidden`, `ClientError`, data errors | give up immediately |
//! | `RateLimited` (429) | retry after `base_delay * 2^attempt` |
//! | `UpstreamUnavailable` (5xx, no response) | retry after `base_delay * (attempt + 1)` |
//!
//! `attempt` is the zero-based index of the attempt that just failed.
//! Once `max_retries` retries have been spent, the last failure is returned
//! wrapped in [`CinegateError::RetriesExhausted`].

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::{CinegateError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// ```rust
/// # use cinegate::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt. 0 = no retry. Default: 3.
    pub max_retries: u32,
    /// Unit of both backoff schedules. Default: 1s.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries after the first attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the backoff unit.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// `base_delay * 2^attempt`, used for 429 responses.
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// `base_delay * (attempt + 1)`, used for server and network failures.
    pub fn linear_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

/// Outcome of classifying a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again (if retries remain).
    Retry(Duration),
    /// Propagate the error as-is.
    GiveUp,
}

/// Maps a failure and the zero-based index of the failed attempt to a decision.
pub type Classifier = fn(&CinegateError, &RetryConfig, u32) -> RetryDecision;

/// Default upstream classifier. See the module docs for the schedule.
pub fn classify(error: &CinegateError, config: &RetryConfig, attempt: u32) -> RetryDecision {
    match error {
        CinegateError::RateLimited => RetryDecision::Retry(config.exponential_delay(attempt)),
        CinegateError::UpstreamUnavailable { .. } => {
            RetryDecision::Retry(config.linear_delay(attempt))
        }
        _ => RetryDecision::GiveUp,
    }
}

/// Bounded retry wrapper around a single upstream call.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    classifier: Classifier,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Policy using the default [`classify`] schedule.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_classifier(config, classify)
    }

    /// Policy using a custom classifier.
    pub fn with_classifier(config: RetryConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `f` until it succeeds, fails terminally, or retries run out.
    ///
    /// `endpoint` only labels logs and metrics.
    pub async fn run<F, Fut, T>(&self, endpoint: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match f().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let wait = match (self.classifier)(&err, &self.config, attempt) {
                RetryDecision::GiveUp => return Err(err),
                RetryDecision::Retry(wait) => wait,
            };

            if attempt >= self.config.max_retries {
                return Err(CinegateError::RetriesExhausted {
                    attempts: attempt + 1,
                    source: Box::new(err),
                });
            }

            metrics::counter!(telemetry::RETRIES_TOTAL,
                "endpoint" => endpoint.to_owned(),
                "reason" => retry_reason(&err),
            )
            .increment(1);
            warn!(
                endpoint,
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = wait.as_millis() as u64,
                error = %err,
                "retrying after transient error"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

fn retry_reason(err: &CinegateError) -> &'static str {
    match err {
        CinegateError::RateLimited => "rate_limited",
        CinegateError::UpstreamUnavailable { .. } => "unavailable",
        _ => "other",
    }
}
