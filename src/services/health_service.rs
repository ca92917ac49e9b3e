use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the store and report the degraded flag together with the provider queue.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let queue = state.queue().status();
    if state.is_degraded() {
        HealthResponse::degraded(queue)
    } else {
        HealthResponse::ok(queue)
    }
}
