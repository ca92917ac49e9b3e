//! Error types raised while talking to the statistics provider.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use super::queue::{QueueClosed, RateLimitSignal, mentions_rate_limit};

/// Convenient result alias returning [`ProviderError`] failures.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures that can occur while fetching schedules or box scores.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key was configured.
    #[error("missing statistics provider environment variable `{var}`")]
    MissingApiKey { var: &'static str },
    /// Building the HTTP client failed.
    #[error("failed to build statistics provider client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent.
    #[error("failed to send statistics provider request to `{endpoint}`")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The provider answered 429 Too Many Requests.
    #[error("statistics provider rate limit hit on `{endpoint}`")]
    RateLimited {
        endpoint: String,
        retry_after: Option<Duration>,
    },
    /// Any other non-success status.
    #[error("unexpected statistics provider status {status} for `{endpoint}`: {message}")]
    Status {
        endpoint: String,
        status: StatusCode,
        message: String,
    },
    /// The body was not valid JSON for the expected type.
    #[error("failed to decode statistics provider response for `{endpoint}`")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The JSON decoded but lacks a section the caller depends on.
    #[error("unexpected statistics provider payload for `{endpoint}`: {detail}")]
    UnexpectedShape { endpoint: String, detail: String },
    /// The request queue dropped the call.
    #[error(transparent)]
    QueueClosed(#[from] QueueClosed),
}

impl RateLimitSignal for ProviderError {
    fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Status {
                status, message, ..
            } => *status == StatusCode::TOO_MANY_REQUESTS || mentions_rate_limit(message),
            _ => false,
        }
    }
}

impl ProviderError {
    /// Suggested wait when the provider asked the caller to slow down.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
