use tokio::sync::broadcast::{self, error::RecvError};

use crate::dto::events::{Channel, ServerEvent};

/// Fan-out of [`ServerEvent`]s to every connected client.
///
/// A single FIFO channel carries every event, so events issued by one
/// controller action reach each subscriber in emission order. Subscribers
/// only see events whose audience includes their role channel.
pub struct BroadcastHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl BroadcastHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a subscriber on `channel` that will receive subsequent events.
    pub fn subscribe(&self, channel: Channel) -> Subscription {
        Subscription {
            channel,
            receiver: self.sender.subscribe(),
        }
    }

    /// Send an event to all current subscribers and return how many were listening.
    ///
    /// Nobody listening is not an error: disconnected clients recover through
    /// the pull queries.
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Receivers currently attached, across all channels.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving half bound to a role channel.
pub struct Subscription {
    channel: Channel,
    receiver: broadcast::Receiver<ServerEvent>,
}

impl Subscription {
    /// Channel this subscription listens on.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Next event addressed to this channel.
    ///
    /// `RecvError::Lagged` is surfaced so the caller can report the loss and keep
    /// reading; `RecvError::Closed` means the hub is gone.
    pub async fn recv(&mut self) -> Result<ServerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if event.audience.includes(self.channel) {
                return Ok(event);
            }
        }
    }
}
