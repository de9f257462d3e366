use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

/// Why a real-time event went nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The store failed while handling the event.
    StoreFailure,
    /// The frame could not be decoded.
    MalformedMessage,
    /// The sender is not allowed to issue the command.
    Unauthorized,
    /// The command does not apply to the current session phase.
    InvalidState,
    /// A subscriber fell behind the channel capacity.
    Lagged,
    /// The payload could not be serialised.
    Serialization,
    /// The client went away before its reply could be written.
    Disconnected,
}

/// Hook notified whenever a real-time event is dropped instead of delivered.
pub trait DeliveryMonitor: Send + Sync {
    /// Called once per dropped event. `event` is the wire name, or a
    /// placeholder such as `<inbound>` when the frame could not be parsed.
    fn event_dropped(&self, event: &str, reason: DropReason, detail: &str);

    /// Number of drops reported since startup.
    fn dropped_total(&self) -> u64;
}

/// Default monitor: a `tracing` warning and a counter.
#[derive(Debug, Default)]
pub struct TracingMonitor {
    dropped: AtomicU64,
}

impl TracingMonitor {
    /// Monitor with a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeliveryMonitor for TracingMonitor {
    fn event_dropped(&self, event: &str, reason: DropReason, detail: &str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(event = %event, reason = ?reason, detail = %detail, "real-time event dropped");
    }

    fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_are_counted() {
        let monitor = TracingMonitor::new();
        assert_eq!(monitor.dropped_total(), 0);
        monitor.event_dropped("nextQuestion", DropReason::StoreFailure, "timeout");
        monitor.event_dropped("<frame>", DropReason::MalformedMessage, "eof");
        assert_eq!(monitor.dropped_total(), 2);
    }
}
