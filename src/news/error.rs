// src/news/error.rs
use thiserror::Error;

/// Why a single adapter produced no articles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no credential configured")]
    MissingCredential,

    #[error("credential rejected: {0}")]
    InvalidCredential(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("unauthorized (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("provider returned no articles")]
    Empty,

    #[error("{0}")]
    Upstream(String),
}

impl ProviderError {
    /// Quota or rate-limit exhaustion, the trigger for degraded mode.
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.as_u16() == 429 => {
                ProviderError::RateLimited(err.to_string())
            }
            Some(status) => ProviderError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => ProviderError::Parse(err.to_string()),
            None => ProviderError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// Wording that upstream APIs use in bodies when a plan's quota is spent.
pub fn mentions_quota(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    [
        "quota",
        "rate limit",
        "ratelimit",
        "rate_limit",
        "ratelimited",
        "too many requests",
        "usage_limit",
        "usage limit",
        "limit exceeded",
        "limitexceeded",
        "resource_exhausted",
        "maximumresultsreached",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

/// Outcome taxonomy of one pass over the provider chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NewsError {
    /// Adapter skipped because it has no usable credential. Never surfaced.
    #[error("{provider} unavailable: no credential configured")]
    ProviderUnavailable { provider: &'static str },

    #[error("{provider} failed: {source}")]
    ProviderCallFailed {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("{}", .last_error.as_deref().unwrap_or(ALL_FAILED_MESSAGE))]
    AllProvidersFailed {
        last_error: Option<String>,
        quota_exhausted: bool,
    },
}

pub const ALL_FAILED_MESSAGE: &str =
    "All news providers failed. Please check your API keys or try again later.";

impl NewsError {
    pub fn is_quota_exhausted(&self) -> bool {
        match self {
            NewsError::AllProvidersFailed {
                quota_exhausted, ..
            } => *quota_exhausted,
            NewsError::ProviderCallFailed { source, .. } => source.is_quota(),
            NewsError::ProviderUnavailable { .. } => false,
        }
    }
}
