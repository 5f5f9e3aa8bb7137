//! Cinegate - request mediation for a rate-limited movie/TV metadata API
//!
//! This crate sits between a routing layer and the TMDB v3 API. Every
//! upstream document is fetched through a TTL + LRU response cache, a
//! token-bucket rate limiter and a bounded retry policy, and every request
//! is recorded by a performance tracker. Composite lookups (detail records,
//! filmographies) fan out a fixed number of calls concurrently and merge
//! the results.
//!
//! # Example
//!
//! ```rust,no_run
//! use cinegate::{Cinegate, MediaKind};
//!
//! #[tokio::main]
//! async fn main() -> cinegate::Result<()> {
//!     let gateway = Cinegate::builder()
//!         .api_key("your-tmdb-key")
//!         .build()?;
//!
//!     for hit in gateway.search("Inception").await? {
//!         println!("{} ({:?})", hit.display_name(), hit.year());
//!     }
//!
//!     let details = gateway.detail(1399, MediaKind::Tv).await?;
//!     println!("{}", details.title());
//!
//!     println!("{:?}", gateway.stats().cache);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! [`GatewayConfig`] is loaded from TOML with `TMDB_*` environment
//! overrides and handed to the builder:
//!
//! ```rust,no_run
//! use cinegate::{Cinegate, GatewayConfig};
//!
//! # fn main() -> cinegate::Result<()> {
//! let mut config = GatewayConfig::load(None)?;
//! config.apply_env_overrides()?;
//! let gateway = Cinegate::builder().config(config).build()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod performance;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod upstream;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheKey, CacheStats, ResponseCache, build_key};
pub use config::{Credential, GatewayConfig, LimitsConfig};
pub use error::{CinegateError, Result};
pub use gateway::{Cinegate, CinegateBuilder, GatewayStats, HealthReport, MediaGateway, Resource};
pub use performance::{
    DurationStats, EndpointStats, OverallStats, PerformanceTracker, RequestRecord,
};
pub use traits::MediaService;
pub use upstream::{
    Classifier, RateLimitConfig, RateLimiter, ReqwestTransport, RetryConfig, RetryDecision,
    RetryPolicy, Transport, UpstreamResponse,
};

// Re-export all types
pub use types::{
    CastMember, CrewInfo, CrewMember, Episode, FilmographyItem, MediaDetails, MediaKind,
    MediaSummary, MovieDetails, PersonFilmography, PersonInfo, PersonSummary, RoleType,
    SearchResult, Season, TvDetails,
};
