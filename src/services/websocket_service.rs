use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        events::{Channel, EVENT_QUESTION},
        ws::{ClientMessage, OutboundFrame, parse_client_message},
    },
    error::ServiceError,
    services::game_controller,
    state::{ClientConnection, DropReason, SharedState, Subscription},
};

/// Who is on the other end of a socket.
#[derive(Debug, Clone, Copy)]
pub struct ClientContext {
    /// Connection id, also the registry key.
    pub id: Uuid,
    /// Channel requested with `?role=`.
    pub role: Channel,
    /// Whether the upgrade request carried a valid admin session.
    pub authenticated: bool,
}

impl ClientContext {
    /// Context for a new connection with a fresh id.
    pub fn new(role: Channel, authenticated: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            authenticated,
        }
    }

    fn may_control(&self) -> bool {
        self.role == Channel::Controller && self.authenticated
    }
}

/// Why an inbound command was not carried out.
#[derive(Debug, Error)]
enum CommandError {
    /// Writer channel closed - connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
    #[error("`{0}` requires an authenticated controller")]
    Unauthorized(&'static str),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

impl CommandError {
    fn drop_reason(&self) -> DropReason {
        match self {
            CommandError::ConnectionClosed => DropReason::Disconnected,
            CommandError::Unauthorized(_) => DropReason::Unauthorized,
            CommandError::Service(err) => match err {
                ServiceError::Unavailable(_)
                | ServiceError::PartialScoring(_)
                | ServiceError::Timeout => DropReason::StoreFailure,
                ServiceError::InvalidInput(_) => DropReason::MalformedMessage,
                ServiceError::Unauthorized(_) | ServiceError::Forbidden(_) => {
                    DropReason::Unauthorized
                }
                ServiceError::InvalidState(_) | ServiceError::NotFound(_) => {
                    DropReason::InvalidState
                }
            },
        }
    }
}

/// Handle the full lifecycle of one real-time client.
pub async fn handle_socket(state: SharedState, socket: WebSocket, client: ClientContext) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    state.register_client(client.id, ClientConnection::new(client.role, outbound_tx.clone()));
    info!(client_id = %client.id, role = ?client.role, authenticated = client.authenticated, "client connected");

    let forwarder = spawn_forwarder(
        state.clone(),
        state.hub().subscribe(client.role),
        client,
        outbound_tx.clone(),
    );

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(client_id = %client.id, payload = %text.as_str(), "received client message");
                let command = match parse_client_message(text.as_str()) {
                    Ok(command) => command,
                    Err(err) => {
                        state.monitor().event_dropped(
                            "<inbound>",
                            DropReason::MalformedMessage,
                            &err.to_string(),
                        );
                        continue;
                    }
                };

                let event = command.event_name();
                if let Err(err) = dispatch(&state, &client, command).await {
                    if matches!(err, CommandError::ConnectionClosed) {
                        info!(client_id = %client.id, "connection closed while replying, terminating");
                        break;
                    }
                    state
                        .monitor()
                        .event_dropped(event, err.drop_reason(), &err.to_string());
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(client_id = %client.id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(client_id = %client.id, error = %err, "websocket error");
                break;
            }
        }
    }

    forwarder.abort();
    state.unregister_client(&client.id);
    info!(client_id = %client.id, role = ?client.role, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Carry out one inbound command on behalf of `client`.
async fn dispatch(
    state: &SharedState,
    client: &ClientContext,
    command: ClientMessage,
) -> Result<(), CommandError> {
    if command.requires_controller() && !client.may_control() {
        return Err(CommandError::Unauthorized(command.event_name()));
    }

    match command {
        ClientMessage::GetQuestion => match game_controller::random_question(state).await {
            Ok(question) => reply(state, client, EVENT_QUESTION, &question),
            Err(ServiceError::NotFound(_)) => reply(state, client, EVENT_QUESTION, &Value::Null),
            Err(err) => Err(err.into()),
        },
        ClientMessage::NextQuestion => {
            game_controller::next_question(state).await?;
            Ok(())
        }
        ClientMessage::ResetSession => {
            game_controller::reset_session(state).await?;
            Ok(())
        }
        ClientMessage::TeamBuzzed { team } => {
            game_controller::buzz(state, &team).await?;
            Ok(())
        }
        ClientMessage::ResetBuzzer => {
            game_controller::reset_buzzer(state).await;
            Ok(())
        }
        ClientMessage::Relay(relay) => {
            game_controller::relay(state, relay);
            Ok(())
        }
    }
}

/// Pump hub events addressed to this client's channel into its writer.
fn spawn_forwarder(
    state: SharedState,
    mut subscription: Subscription,
    client: ClientContext,
    outbound_tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(event) => {
                    let Some(frame) = encode_frame(&state, event.name, &event.data) else {
                        continue;
                    };
                    if outbound_tx.send(frame).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    state.monitor().event_dropped(
                        "<broadcast>",
                        DropReason::Lagged,
                        &format!("client {} skipped {skipped} events", client.id),
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Send a frame to `client` only, through the connection registry.
///
/// A payload that cannot be serialized is reported and skipped.
fn reply<T: Serialize>(
    state: &SharedState,
    client: &ClientContext,
    event: &'static str,
    data: &T,
) -> Result<(), CommandError> {
    let Some(frame) = encode_frame(state, event, data) else {
        return Ok(());
    };
    if state.send_to(&client.id, frame) {
        Ok(())
    } else {
        Err(CommandError::ConnectionClosed)
    }
}

/// Render `{event, data}` as a text frame, reporting serialization failures.
fn encode_frame<T: Serialize>(state: &SharedState, event: &str, data: &T) -> Option<Message> {
    match serde_json::to_string(&OutboundFrame { event, data }) {
        Ok(payload) => Some(Message::Text(payload.into())),
        Err(err) => {
            state
                .monitor()
                .event_dropped(event, DropReason::Serialization, &err.to_string());
            None
        }
    }
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
