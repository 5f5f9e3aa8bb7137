//! HTTP transport capability consumed by the gateway.
//!
//! The gateway only needs "GET a path with query parameters, give me the
//! status and the JSON body". [`Transport`] is that seam; [`ReqwestTransport`]
//! is the production implementation and owns connection pooling.
//!
//! A transport never interprets the status code. Mapping statuses onto
//! [`CinegateError`] happens in the gateway so every transport gets the same
//! retry classification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{CinegateError, Result};

/// Default base URL for the TMDB v3 API.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Status and parsed body of one upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// `Value::Null` when the body was empty or not JSON.
    pub body: Value,
}

/// Performs a single GET against the upstream API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` (relative to the transport's base URL).
    ///
    /// Returns `Err(UpstreamUnavailable { status: None, .. })` when no
    /// response was received (connect failure, timeout, reset).
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<UpstreamResponse>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Transport against the public TMDB API.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, 5)
    }

    /// Transport against a custom base URL (for testing with wiremock).
    ///
    /// `max_idle_connections` bounds the idle keep-alive pool per host.
    pub fn with_base_url(base_url: impl Into<String>, max_idle_connections: usize) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(max_idle_connections)
            .build()
            .map_err(|e| CinegateError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<UpstreamResponse> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| CinegateError::UpstreamUnavailable {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CinegateError::UpstreamUnavailable {
                status: None,
                message: e.to_string(),
            })?;

        // Error pages are not always JSON; the status alone is enough to classify them.
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok(UpstreamResponse { status, body })
    }
}
