use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, provider::ProviderError, state::week::WeekError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or unknown caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Caller is known but the action is closed to them.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The statistics provider, or our own pacing, asks the caller to wait.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Duration,
    },
    /// The statistics provider failed.
    #[error("statistics provider failure")]
    Provider(#[source] ProviderError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => ServiceError::InvalidState(message),
            StorageError::Missing { message } => ServiceError::NotFound(message),
            unavailable @ StorageError::Unavailable { .. } => {
                ServiceError::Unavailable(unavailable)
            }
        }
    }
}

/// Fallback wait when the provider rate limits without a hint.
const PROVIDER_RETRY_AFTER: Duration = Duration::from_secs(60);

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        use crate::provider::queue::RateLimitSignal;

        if err.is_rate_limited() {
            ServiceError::RateLimited {
                retry_after: err.retry_after().unwrap_or(PROVIDER_RETRY_AFTER),
                message: "Statistics provider rate limit reached, please wait".into(),
            }
        } else {
            ServiceError::Provider(err)
        }
    }
}

impl From<WeekError> for ServiceError {
    fn from(err: WeekError) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Action not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Caller should retry later.
    #[error("{message}")]
    TooManyRequests {
        message: String,
        retry_after_secs: u64,
    },
    /// Upstream statistics provider failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::RateLimited {
                message,
                retry_after,
            } => AppError::TooManyRequests {
                message,
                retry_after_secs: retry_after.as_secs().max(1),
            },
            ServiceError::Provider(source) => {
                error!(error = %source, "statistics provider request failed");
                AppError::BadGateway(source.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let retry_after_secs = match &self {
            AppError::TooManyRequests {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
            retry_after_secs,
        });

        let mut response = (status, payload).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::week::WeekKey;

    #[test]
    fn rate_limited_maps_to_429_with_header() {
        let err: AppError = ServiceError::RateLimited {
            message: "please wait".into(),
            retry_after: Duration::from_secs(60),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "60");
    }

    #[test]
    fn provider_429_becomes_rate_limited() {
        let err: ServiceError = ProviderError::RateLimited {
            endpoint: "schedule".into(),
            retry_after: Some(Duration::from_secs(12)),
        }
        .into();
        assert!(matches!(
            err,
            ServiceError::RateLimited { retry_after, .. } if retry_after == Duration::from_secs(12)
        ));
    }

    #[test]
    fn finalized_week_maps_to_conflict() {
        let err: AppError = ServiceError::from(WeekError::Finalized(WeekKey::new(2024, 1))).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_conflict_is_not_unavailable() {
        let err: ServiceError = StorageError::conflict("dup").into();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
