use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::{events::Channel, sse::Handshake},
    state::{DropReason, SharedState, Subscription},
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Convert a hub subscription into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    mut subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let role = subscription.channel();

    tokio::spawn(async move {
        if let Some(event) = handshake_event(&state, role) {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = subscription.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let event = match Event::default().event(payload.name).json_data(&payload.data) {
                                Ok(event) => event,
                                Err(err) => {
                                    state.monitor().event_dropped(payload.name, DropReason::Serialization, &err.to_string());
                                    continue;
                                }
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            state.monitor().event_dropped(
                                "<broadcast>",
                                DropReason::Lagged,
                                &format!("SSE {role:?} stream skipped {skipped} events"),
                            );
                        }
                    }
                }
            }
        }

        info!(role = ?role, "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn handshake_event(state: &SharedState, role: Channel) -> Option<Event> {
    let handshake = Handshake {
        role,
        message: "subscribed".into(),
        degraded: state.is_degraded(),
    };
    match Event::default().event(EVENT_HANDSHAKE).json_data(&handshake) {
        Ok(event) => Some(event),
        Err(err) => {
            state
                .monitor()
                .event_dropped(EVENT_HANDSHAKE, DropReason::Serialization, &err.to_string());
            None
        }
    }
}
