use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::events::Channel;

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Role channel the stream listens on.
    pub role: Channel,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the question store is currently unreachable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the question store is currently unreachable.
    pub degraded: bool,
}
