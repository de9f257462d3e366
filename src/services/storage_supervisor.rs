use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{services::hub_events::broadcast_system_status, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll the question store and flip the degraded flag when it stops answering.
///
/// Runs after the initial connection succeeded; it never gives up, a lost
/// store keeps being retried with capped exponential backoff.
pub async fn run(state: SharedState) {
    let store = state.store();

    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    mark_degraded(&state, false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                mark_degraded(&state, true);

                let mut attempt = 0u32;
                let mut delay = INITIAL_DELAY;
                loop {
                    match store.try_reconnect().await {
                        Ok(()) => {
                            info!(attempt, "storage reconnection succeeded");
                            mark_degraded(&state, false);
                            break;
                        }
                        Err(reconnect_err) => {
                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                            attempt += 1;
                            sleep(delay).await;
                            delay = (delay * 2).min(MAX_DELAY);
                        }
                    }
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}

fn mark_degraded(state: &SharedState, degraded: bool) {
    if state.is_degraded() != degraded {
        state.set_degraded(degraded);
        broadcast_system_status(state, degraded);
    }
}
