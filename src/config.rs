//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. the CLI `--config` flag)
//! 2. `~/.cinegate/config.toml` (user)
//! 3. `/etc/cinegate/config.toml` (system)
//! 4. built-in defaults when no file exists
//!
//! Environment variables (`TMDB_CACHE_TTL_MINUTES`, `TMDB_MAX_RETRIES`, ...)
//! override file values; see [`GatewayConfig::apply_env_overrides`].
//!
//! The API credential is never part of the config file. It is read from
//! `TMDB_API_KEY` into a [`Credential`] that redacts itself in `Debug`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::upstream::{DEFAULT_BASE_URL, RateLimitConfig, RetryConfig};
use crate::{CinegateError, Result};

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub performance: PerformanceSettings,
}

/// Upstream connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the upstream API (default: TMDB v3).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
    /// Idle keep-alive connections kept per host (default: 5).
    #[serde(default = "default_max_idle")]
    pub max_idle_connections: usize,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_idle_connections: default_max_idle(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> f64 {
    30.0
}

fn default_max_idle() -> usize {
    5
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Entry time-to-live in minutes (default: 60).
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: f64,
    /// Maximum live entries (default: 1000).
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            max_size: default_cache_max_size(),
        }
    }
}

fn default_ttl_minutes() -> f64 {
    60.0
}

fn default_cache_max_size() -> usize {
    1_000
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff unit in seconds (default: 1.0).
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> f64 {
    1.0
}

/// Outbound rate limit. TMDB allows 40 requests per 10 seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Token refill rate (default: 4.0).
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,
    /// Bucket capacity (default: 40).
    #[serde(default = "default_burst")]
    pub burst_limit: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst_limit: default_burst(),
        }
    }
}

fn default_rps() -> f64 {
    4.0
}

fn default_burst() -> u32 {
    40
}

/// Caps on result list sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum search hits returned (default: 100).
    #[serde(default = "default_max_search")]
    pub max_search_results: usize,
    /// Cast members shown per detail record (default: 15).
    #[serde(default = "default_max_cast")]
    pub max_cast_members: usize,
    /// Credits kept per filmography list (default: 500).
    #[serde(default = "default_max_filmography")]
    pub max_filmography_items: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_search_results: default_max_search(),
            max_cast_members: default_max_cast(),
            max_filmography_items: default_max_filmography(),
        }
    }
}

fn default_max_search() -> usize {
    100
}

fn default_max_cast() -> usize {
    15
}

fn default_max_filmography() -> usize {
    500
}

/// Performance tracker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSettings {
    /// Request records retained (default: 1000).
    #[serde(default = "default_max_records")]
    pub max_entries: usize,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_records(),
        }
    }
}

fn default_max_records() -> usize {
    crate::performance::DEFAULT_MAX_RECORDS
}

impl GatewayConfig {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing
    /// standard file is used, falling back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CinegateError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CinegateError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CinegateError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(CinegateError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".cinegate").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/cinegate/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply `TMDB_*` environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unset variables leave the current value alone; unparsable ones are a
    /// configuration error naming the variable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "TMDB_CACHE_TTL_MINUTES")? {
            self.cache.ttl_minutes = v;
        }
        if let Some(v) = parse_var(&lookup, "TMDB_CACHE_MAX_SIZE")? {
            self.cache.max_size = v;
        }
        if let Some(v) = parse_var(&lookup, "TMDB_TIMEOUT_SECONDS")? {
            self.upstream.timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "TMDB_MAX_RETRIES")? {
            self.retry.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "TMDB_RETRY_DELAY")? {
            self.retry.base_delay_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "TMDB_MAX_SEARCH_RESULTS")? {
            self.limits.max_search_results = v;
        }
        if let Some(v) = parse_var(&lookup, "TMDB_MAX_CAST_MEMBERS")? {
            self.limits.max_cast_members = v;
        }
        if let Some(v) = lookup("TMDB_BASE_URL").filter(|s| !s.is_empty()) {
            self.upstream.base_url = v;
        }
        Ok(())
    }

    /// Reject values that would make the gateway misbehave.
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64, field: &str| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CinegateError::Configuration(format!(
                    "{field} must be positive, got {value}"
                )))
            }
        };
        positive(self.upstream.timeout_secs, "upstream.timeout_secs")?;
        positive(self.cache.ttl_minutes, "cache.ttl_minutes")?;
        positive(self.rate_limit.requests_per_second, "rate_limit.requests_per_second")?;
        if !self.retry.base_delay_secs.is_finite() || self.retry.base_delay_secs < 0.0 {
            return Err(CinegateError::Configuration(format!(
                "retry.base_delay_secs must not be negative, got {}",
                self.retry.base_delay_secs
            )));
        }
        if self.rate_limit.burst_limit == 0 {
            return Err(CinegateError::Configuration(
                "rate_limit.burst_limit must be at least 1".to_string(),
            ));
        }
        representable(self.upstream.timeout_secs, "upstream.timeout_secs")?;
        representable(self.cache.ttl_minutes * 60.0, "cache.ttl_minutes")?;
        representable(self.retry.base_delay_secs, "retry.base_delay_secs")?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        saturating_secs(self.upstream.timeout_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_size(self.cache.max_size)
            .ttl(saturating_secs(self.cache.ttl_minutes * 60.0))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_retries(self.retry.max_retries)
            .base_delay(saturating_secs(self.retry.base_delay_secs))
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new()
            .requests_per_second(self.rate_limit.requests_per_second)
            .burst_limit(self.rate_limit.burst_limit)
    }
}

fn representable(secs: f64, field: &str) -> Result<()> {
    Duration::try_from_secs_f64(secs)
        .map(|_| ())
        .map_err(|e| CinegateError::Configuration(format!("{field} out of range: {e}")))
}

// Accessors stay infallible for unvalidated configs; `validate` rejects these values.
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            CinegateError::Configuration(format!("Invalid value for {name} ('{raw}'): {e}"))
        }),
    }
}

/// Upstream API key. Redacted in `Debug` and `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read [`API_KEY_ENV`]; `None` if unset or blank.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self)
    }

    /// The raw key, for building the upstream query.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
