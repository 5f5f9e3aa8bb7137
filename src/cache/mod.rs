//! Caching subsystem.
//!
//! - [`key`]: derives a [`CacheKey`] from an endpoint and its query
//!   parameters. Credentials never factor into the key, so callers with
//!   different API keys share entries.
//!
//! - [`response::ResponseCache`]: TTL + bounded LRU store of upstream
//!   documents with hit/miss/eviction/expiration counters. Owned by
//!   [`MediaGateway`](crate::MediaGateway); see the [`response`] module docs
//!   for the eviction and concurrency rules.

pub mod key;
pub mod response;

pub use key::{CREDENTIAL_PARAM, CacheKey, build_key};
pub use response::{CacheConfig, CacheStats, ResponseCache};
