//! Cinegate error types

/// Cinegate error types
#[derive(Debug, thiserror::Error)]
pub enum CinegateError {
    // Terminal upstream errors
    #[error("invalid API credential")]
    InvalidCredential,

    /// 403: the credential was accepted but lacks access to the resource.
    #[error("upstream denied access: {message}")]
    Forbidden { message: String },

    #[error("upstream rejected request ({status}): {message}")]
    ClientError { status: u16, message: String },

    // Transient upstream errors
    #[error("rate limited by upstream")]
    RateLimited,

    /// 5xx response, or no response at all (`status` is `None`).
    #[error("upstream unavailable ({}): {message}", status_label(.status))]
    UpstreamUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<CinegateError>,
    },

    /// Terminal failure of a logical gateway operation.
    #[error("{operation} failed for {target}: {source}")]
    Operation {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<CinegateError>,
    },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected upstream data: {0}")]
    DataError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl CinegateError {
    /// Whether a retry might succeed.
    ///
    /// Only `RateLimited` and `UpstreamUnavailable` qualify; everything else
    /// is terminal and crosses component boundaries unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CinegateError::RateLimited | CinegateError::UpstreamUnavailable { .. }
        )
    }

    /// HTTP status behind this error, if one was observed.
    ///
    /// Looks through `RetriesExhausted` and `Operation` wrappers so a routing
    /// layer can map the root cause onto its own response codes.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CinegateError::InvalidCredential => Some(401),
            CinegateError::Forbidden { .. } => Some(403),
            CinegateError::ClientError { status, .. } => Some(*status),
            CinegateError::RateLimited => Some(429),
            CinegateError::UpstreamUnavailable { status, .. } => *status,
            CinegateError::RetriesExhausted { source, .. }
            | CinegateError::Operation { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Map an upstream HTTP status onto the error taxonomy.
    ///
    /// Returns `None` for 2xx.
    pub fn from_status(status: u16, message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        match status {
            200..=299 => None,
            401 => Some(CinegateError::InvalidCredential),
            403 => Some(CinegateError::Forbidden { message }),
            429 => Some(CinegateError::RateLimited),
            500..=599 => Some(CinegateError::UpstreamUnavailable {
                status: Some(status),
                message,
            }),
            _ => Some(CinegateError::ClientError { status, message }),
        }
    }

    /// Wrap a terminal failure with the logical operation and its target.
    pub(crate) fn in_operation(self, operation: &'static str, target: impl Into<String>) -> Self {
        CinegateError::Operation {
            operation,
            target: target.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for Cinegate operations
pub type Result<T> = std::result::Result<T, CinegateError>;
