//! Cache key derivation.
//!
//! Keys are a content hash of the endpoint name and its query parameters,
//! so two callers asking for the same resource share one entry. The
//! credential parameter never contributes to the key.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

/// Query parameter carrying the upstream API credential.
pub const CREDENTIAL_PARAM: &str = "api_key";

/// Stable identity of a cached upstream response.
///
/// Lowercase hex SHA-256 of `"{endpoint}:{sorted params as JSON}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the cache key for `endpoint` called with `params`.
///
/// Parameters are sorted by name before hashing, so insertion order does not
/// matter. [`CREDENTIAL_PARAM`] is dropped. If a name repeats, the last value
/// wins, matching how the query string would be read upstream.
pub fn build_key<K, V>(endpoint: &str, params: &[(K, V)]) -> CacheKey
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .filter(|(k, _)| *k != CREDENTIAL_PARAM)
        .collect();

    // BTreeMap<&str, &str> always serializes; the fallback is unreachable.
    let encoded = serde_json::to_string(&sorted).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(encoded.as_bytes());
    CacheKey(hex::encode(hasher.finalize()))
}
