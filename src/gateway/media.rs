//! MediaGateway - cached, rate-limited, retried access to the upstream API

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::{try_join, try_join3};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::resource::Resource;
use super::shape;
use crate::cache::{CREDENTIAL_PARAM, CacheStats, ResponseCache, build_key};
use crate::config::{Credential, GatewayConfig, LimitsConfig};
use crate::performance::{EndpointStats, OverallStats, PerformanceTracker};
use crate::telemetry;
use crate::types::{
    Episode, MediaDetails, MediaKind, PersonFilmography, SearchResult, Season, TvDetails,
};
use crate::upstream::{RateLimiter, RetryPolicy, Transport};
use crate::{CinegateError, Result};

/// Cache and request statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayStats {
    pub cache: CacheStats,
    pub performance: OverallStats,
}

/// Result of [`MediaGateway::health`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// "healthy" when the credential probe succeeded, "unhealthy" otherwise.
    pub status: &'static str,
    pub credentials_valid: bool,
    /// Probe failure, if any.
    pub error: Option<String>,
    pub cache: CacheStats,
    pub performance: OverallStats,
    pub available_tokens: f64,
    /// Effective configuration. Never includes the credential.
    pub config: GatewayConfig,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.credentials_valid
    }
}

/// Gateway in front of the upstream metadata API.
///
/// Every upstream document goes through [`fetch`](Self::fetch): cache
/// lookup, then on a miss the rate limiter, the retry policy and the
/// transport. Composite operations fan out a fixed number of fetches and
/// merge the shaped documents.
///
/// Construct with [`Cinegate::builder()`](crate::Cinegate::builder).
pub struct MediaGateway {
    transport: Arc<dyn Transport>,
    credential: Credential,
    cache: Arc<ResponseCache>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    tracker: Arc<PerformanceTracker>,
    timeout: Duration,
    limits: LimitsConfig,
    config: GatewayConfig,
}

impl std::fmt::Debug for MediaGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaGateway")
            .field("credential", &self.credential)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl MediaGateway {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        credential: Credential,
        cache: Arc<ResponseCache>,
        limiter: RateLimiter,
        retry: RetryPolicy,
        tracker: Arc<PerformanceTracker>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            transport,
            credential,
            cache,
            limiter,
            retry,
            tracker,
            timeout: config.timeout(),
            limits: config.limits.clone(),
            config,
        }
    }

    // =========================================================================
    // Fetch pipeline
    // =========================================================================

    /// Fetch one upstream document through the cache.
    ///
    /// `params` exclude the credential; it is appended here and never
    /// reaches the cache key.
    pub async fn fetch(&self, resource: Resource, params: &[(&str, &str)]) -> Result<Value> {
        let path = resource.path();
        let query = self.query(params);
        let key = build_key(&path, &query);
        let start = Instant::now();

        if let Some(doc) = self.cache.get(&key) {
            self.finish(resource, &path, start, true, Ok(200));
            return Ok(doc);
        }

        let outcome = self.call(resource, &path, &query).await;
        let status = match &outcome {
            Ok((status, _)) => Ok(*status),
            Err(e) => Err(e),
        };
        self.finish(resource, &path, start, false, status);

        let (_, doc) = outcome?;
        self.cache.set(key, doc.clone());
        Ok(doc)
    }

    /// Fetch one upstream document, skipping the cache entirely.
    async fn fetch_uncached(&self, resource: Resource) -> Result<Value> {
        let path = resource.path();
        let query = self.query(&[]);
        let start = Instant::now();

        let outcome = self.call(resource, &path, &query).await;
        let status = match &outcome {
            Ok((status, _)) => Ok(*status),
            Err(e) => Err(e),
        };
        self.finish(resource, &path, start, false, status);
        outcome.map(|(_, doc)| doc)
    }

    fn query(&self, params: &[(&str, &str)]) -> Vec<(String, String)> {
        params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain(std::iter::once((
                CREDENTIAL_PARAM.to_string(),
                self.credential.expose().to_string(),
            )))
            .collect()
    }

    /// Rate-limited, retried transport call with status classification.
    async fn call(
        &self,
        resource: Resource,
        path: &str,
        query: &[(String, String)],
    ) -> Result<(u16, Value)> {
        let timeout = self.timeout;
        let limiter = &self.limiter;
        let transport = self.transport.as_ref();

        self.retry
            .run(resource.name(), move || async move {
                limiter.acquire().await;
                let response = transport.get(path, query, timeout).await?;
                match CinegateError::from_status(response.status, status_message(&response.body)) {
                    Some(err) => Err(err),
                    None => Ok((response.status, response.body)),
                }
            })
            .await
    }

    /// Record the outcome in the tracker and in metrics.
    fn finish(
        &self,
        resource: Resource,
        path: &str,
        start: Instant,
        cached: bool,
        outcome: std::result::Result<u16, &CinegateError>,
    ) {
        let elapsed = start.elapsed();
        let (status_code, error) = match outcome {
            Ok(status) => (Some(status), None),
            Err(e) => (e.status_code(), Some(e.to_string())),
        };
        let status_label = if error.is_none() { "ok" } else { "error" };
        let cached_label = if cached { "true" } else { "false" };

        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "endpoint" => resource.name(),
            "status" => status_label,
            "cached" => cached_label,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "endpoint" => resource.name(),
        )
        .record(elapsed.as_secs_f64());

        if let Some(ref err) = error {
            debug!(path, error = %err, "upstream request failed");
        }

        self.tracker
            .record(path, elapsed.as_secs_f64() * 1000.0, cached, status_code, error);
    }

    // =========================================================================
    // Logical operations
    // =========================================================================

    /// Multi search over movies, series and people.
    #[instrument(skip(self), fields(operation = "search"))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CinegateError::InvalidInput(
                "search query must not be empty".to_string(),
            ));
        }

        let doc = self
            .fetch(Resource::SearchMulti, &[("query", query)])
            .await
            .map_err(|e| e.in_operation("search", format!("'{query}'")))?;

        shape::search_results(&doc, self.limits.max_search_results)
            .map_err(|e| e.in_operation("search", format!("'{query}'")))
    }

    /// Composite detail record for a movie or series.
    ///
    /// Primary, credits and keywords documents are fetched concurrently.
    /// For series the last episode of the latest season is looked up
    /// afterwards; a failure there leaves the episode fields empty.
    #[instrument(skip(self), fields(operation = "detail"))]
    pub async fn detail(&self, id: u64, kind: MediaKind) -> Result<MediaDetails> {
        self.detail_inner(id, kind)
            .await
            .map_err(|e| e.in_operation("detail", format!("{kind} {id}")))
    }

    async fn detail_inner(&self, id: u64, kind: MediaKind) -> Result<MediaDetails> {
        let (primary, credits, keywords) = try_join3(
            self.fetch(Resource::Details(kind, id), &[]),
            self.fetch(Resource::Credits(kind, id), &[]),
            self.fetch(Resource::Keywords(kind, id), &[]),
        )
        .await?;

        let max_cast = self.limits.max_cast_members;
        match kind {
            MediaKind::Movie => {
                shape::movie_details(id, &primary, &credits, &keywords, max_cast)
                    .map(MediaDetails::Movie)
            }
            MediaKind::Tv => {
                let mut details = shape::tv_details(id, &primary, &credits, &keywords, max_cast)?;
                if let Some(season) = shape::latest_season(&primary)? {
                    details.season = Some(season);
                    self.attach_latest_episode(&mut details, season).await;
                }
                Ok(MediaDetails::Tv(details))
            }
        }
    }

    async fn attach_latest_episode(&self, details: &mut TvDetails, season: u32) {
        let latest = match self.fetch(Resource::TvSeason(details.id, season), &[]).await {
            Ok(doc) => shape::latest_episode(&doc),
            Err(e) => Err(e),
        };

        match latest {
            Ok(Some((episode, title))) => {
                details.episode = Some(episode);
                details.episode_title = title;
            }
            Ok(None) => debug!(id = details.id, season, "latest season lists no episodes"),
            Err(e) => warn!(
                id = details.id,
                season,
                error = %e,
                "latest episode unavailable"
            ),
        }
    }

    /// Season list of a series, specials excluded.
    #[instrument(skip(self), fields(operation = "seasons"))]
    pub async fn seasons(&self, id: u64) -> Result<Vec<Season>> {
        self.fetch(Resource::Details(MediaKind::Tv, id), &[])
            .await
            .and_then(|doc| shape::seasons(&doc))
            .map_err(|e| e.in_operation("seasons", format!("tv {id}")))
    }

    /// Episode list of one season.
    #[instrument(skip(self), fields(operation = "episodes"))]
    pub async fn episodes(&self, id: u64, season: u32) -> Result<Vec<Episode>> {
        self.fetch(Resource::TvSeason(id, season), &[])
            .await
            .and_then(|doc| shape::episodes(&doc, season))
            .map_err(|e| e.in_operation("episodes", format!("tv {id} season {season}")))
    }

    /// Person profile with cast and crew credits, newest first.
    #[instrument(skip(self), fields(operation = "person_filmography"))]
    pub async fn person_filmography(&self, person_id: u64) -> Result<PersonFilmography> {
        self.filmography_inner(person_id)
            .await
            .map_err(|e| e.in_operation("person_filmography", format!("person {person_id}")))
    }

    async fn filmography_inner(&self, person_id: u64) -> Result<PersonFilmography> {
        let (profile, credits) = try_join(
            self.fetch(Resource::Person(person_id), &[]),
            self.fetch(Resource::PersonCombinedCredits(person_id), &[]),
        )
        .await?;

        let person = shape::person_info(person_id, &profile)?;
        let (cast, crew) = shape::filmography(&credits, self.limits.max_filmography_items)?;
        Ok(PersonFilmography { person, cast, crew })
    }

    // =========================================================================
    // Health and statistics
    // =========================================================================

    /// Probe the credential against a cheap authenticated endpoint.
    ///
    /// `Ok(false)` means the upstream rejected the key; other failures are errors.
    pub async fn validate_credentials(&self) -> Result<bool> {
        match self.fetch_uncached(Resource::Configuration).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.status_code(), Some(401 | 403)) => Ok(false),
            Err(e) => Err(e.in_operation("validate_credentials", "configuration")),
        }
    }

    /// Credential probe plus cache, request and limiter state.
    pub async fn health(&self) -> HealthReport {
        let (credentials_valid, error) = match self.validate_credentials().await {
            Ok(true) => (true, None),
            Ok(false) => (false, Some(CinegateError::InvalidCredential.to_string())),
            Err(e) => (false, Some(e.to_string())),
        };

        HealthReport {
            status: if credentials_valid { "healthy" } else { "unhealthy" },
            credentials_valid,
            error,
            cache: self.cache.stats(),
            performance: self.tracker.overall_stats(),
            available_tokens: self.limiter.available_tokens().await,
            config: self.config.clone(),
        }
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            cache: self.cache.stats(),
            performance: self.tracker.overall_stats(),
        }
    }

    /// Statistics for one upstream path, e.g. `/search/multi`.
    pub fn endpoint_stats(&self, endpoint: &str) -> EndpointStats {
        self.tracker.endpoint_stats(endpoint)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Drop every cached document. Returns how many were removed.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Remove expired cache entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    /// Periodically remove expired cache entries in the background.
    ///
    /// The task holds a weak reference and exits once the gateway is dropped.
    pub fn spawn_cache_janitor(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(gateway) = weak.upgrade() else {
                    debug!("gateway dropped, cache janitor exiting");
                    break;
                };
                let removed = gateway.cleanup_expired();
                if removed > 0 {
                    info!(removed, "cache janitor removed expired entries");
                }
            }
        })
    }
}

/// TMDB error bodies carry `status_message`; fall back to the raw body.
fn status_message(body: &Value) -> String {
    match body.get("status_message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None if body.is_null() => "empty response body".to_string(),
        None => body.to_string(),
    }
}
