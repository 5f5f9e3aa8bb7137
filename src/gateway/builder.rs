//! Builder for configuring gateway instances

use std::sync::Arc;

use super::MediaGateway;
use crate::cache::ResponseCache;
use crate::config::{Credential, GatewayConfig};
use crate::performance::PerformanceTracker;
use crate::upstream::{Classifier, RateLimiter, ReqwestTransport, RetryPolicy, Transport};
use crate::{CinegateError, Result};

/// Main entry point for creating gateway instances.
pub struct Cinegate;

impl Cinegate {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> CinegateBuilder {
        CinegateBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct CinegateBuilder {
    credential: Option<Credential>,
    config: GatewayConfig,
    transport: Option<Arc<dyn Transport>>,
    classifier: Option<Classifier>,
}

impl CinegateBuilder {
    pub fn new() -> Self {
        Self {
            credential: None,
            config: GatewayConfig::default(),
            transport: None,
            classifier: None,
        }
    }

    /// Set the upstream API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.credential = Some(Credential::new(key));
        self
    }

    /// Set the upstream API key from an existing credential.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the upstream base URL (for testing with wiremock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.upstream.base_url = url.into();
        self
    }

    /// Set the per-request timeout (seconds).
    pub fn timeout(mut self, secs: f64) -> Self {
        self.config.upstream.timeout_secs = secs;
        self
    }

    /// Use a custom transport instead of the pooled reqwest client.
    ///
    /// `base_url` and `max_idle_connections` are ignored when set.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom failure classifier for the retry policy.
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Build the gateway.
    ///
    /// Falls back to `TMDB_API_KEY` when no key was given.
    pub fn build(self) -> Result<MediaGateway> {
        let credential = self
            .credential
            .or_else(Credential::from_env)
            .ok_or_else(|| {
                CinegateError::Configuration(format!(
                    "no API key configured (set {})",
                    crate::config::API_KEY_ENV
                ))
            })?;

        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_base_url(
                self.config.upstream.base_url.clone(),
                self.config.upstream.max_idle_connections,
            )?),
        };

        let retry = match self.classifier {
            Some(classifier) => RetryPolicy::with_classifier(self.config.retry_config(), classifier),
            None => RetryPolicy::new(self.config.retry_config()),
        };

        let cache = Arc::new(ResponseCache::new(&self.config.cache_config()));
        let limiter = RateLimiter::new(&self.config.rate_limit_config());
        let tracker = Arc::new(PerformanceTracker::new(self.config.performance.max_entries));

        tracing::debug!(
            base_url = %self.config.upstream.base_url,
            cache_max_size = self.config.cache.max_size,
            max_retries = self.config.retry.max_retries,
            "building media gateway"
        );

        Ok(MediaGateway::new(
            transport,
            credential,
            cache,
            limiter,
            retry,
            tracker,
            self.config,
        ))
    }
}

impl Default for CinegateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
