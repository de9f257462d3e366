use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Login bodies and gated page responses.
pub mod auth;
pub mod events;
/// Guest submission bodies.
pub mod guest;
/// Health check body.
pub mod health;
/// Session snapshot bodies.
pub mod phase;
/// Question bodies.
pub mod question;
/// SSE-only payloads.
pub mod sse;
pub mod validation;
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
