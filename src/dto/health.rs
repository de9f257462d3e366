use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Real-time events dropped since startup (store failures, bad frames, lagging clients).
    pub dropped_events: u64,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(dropped_events: u64) -> Self {
        Self {
            status: "ok".to_string(),
            dropped_events,
        }
    }

    /// Create a health response indicating the question store is unreachable.
    pub fn degraded(dropped_events: u64) -> Self {
        Self {
            status: "degraded".to_string(),
            dropped_events,
        }
    }
}
