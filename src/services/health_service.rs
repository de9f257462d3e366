use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the store health and the number of dropped real-time events.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Err(err) = state.store().health_check().await {
        warn!(error = %err, "storage health check failed");
    }

    let dropped = state.monitor().dropped_total();
    if state.is_degraded() {
        HealthResponse::degraded(dropped)
    } else {
        HealthResponse::ok(dropped)
    }
}
