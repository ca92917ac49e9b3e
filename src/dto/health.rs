use serde::Serialize;
use utoipa::ToSchema;

use crate::provider::QueueStatus;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Outbound statistics provider queue.
    pub provider_queue: QueueStatus,
}

impl HealthResponse {
    /// Healthy response.
    pub fn ok(provider_queue: QueueStatus) -> Self {
        Self {
            status: "ok".to_string(),
            provider_queue,
        }
    }

    /// Response while storage is unreachable.
    pub fn degraded(provider_queue: QueueStatus) -> Self {
        Self {
            status: "degraded".to_string(),
            provider_queue,
        }
    }
}
