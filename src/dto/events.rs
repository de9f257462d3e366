//! Events fanned out by the broadcast hub and the role channels they target.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Reply to `getQuestion`, sent to the requester only.
pub const EVENT_QUESTION: &str = "question";
/// A new question is on screen.
pub const EVENT_NEXT_QUESTION: &str = "nextQuestion";
/// The progression went past the last question.
pub const EVENT_NO_MORE_QUESTIONS: &str = "noMoreQuestions";
/// The session was rewound; carries the new epoch.
pub const EVENT_SESSION_RESET: &str = "sessionReset";
/// Winning team of the buzzer race.
pub const EVENT_TEAM_BUZZED: &str = "teamBuzzed";
/// The buzzer race is open again.
pub const EVENT_RESET_BUZZER: &str = "resetBuzzer";

/// Role a connected client plays. Each role listens on its own channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Device driving the progression (requires the admin cookie).
    Controller,
    /// Shared game screen.
    #[default]
    #[serde(alias = "game")]
    Display,
    /// Buzzer station.
    Buzzer,
    /// Guest phone submitting ranked answers.
    Guest,
}

impl Channel {
    /// Every role, in a stable order.
    pub const ALL: [Channel; 4] = [
        Channel::Controller,
        Channel::Display,
        Channel::Buzzer,
        Channel::Guest,
    ];
}

/// Set of channels an event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every channel.
    All,
    /// Listed channels only.
    Only(Vec<Channel>),
}

impl Audience {
    /// Whether subscribers of `channel` receive the event.
    pub fn includes(&self, channel: Channel) -> bool {
        match self {
            Audience::All => true,
            Audience::Only(channels) => channels.contains(&channel),
        }
    }
}

/// Dispatched payload carried across the hub.
#[derive(Debug, Clone)]
pub struct ServerEvent {
    /// Wire event name.
    pub name: &'static str,
    /// Channels that receive the event.
    pub audience: Audience,
    /// Payload sent as the frame's `data`.
    pub data: Value,
}

impl ServerEvent {
    /// Event addressed to every channel, serialising `payload` into the data field.
    pub fn json<T>(name: &'static str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            name,
            audience: Audience::All,
            data: serde_json::to_value(payload)?,
        })
    }

    /// Event without payload, addressed to every channel.
    pub fn signal(name: &'static str) -> Self {
        Self {
            name,
            audience: Audience::All,
            data: Value::Null,
        }
    }

    /// Relay event: the payload is forwarded exactly as received.
    pub fn passthrough(relay: Passthrough) -> Self {
        Self {
            name: relay.kind.event_name(),
            audience: Audience::All,
            data: relay.payload,
        }
    }

    /// Restrict the event to `audience`.
    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }
}

/// Events the server relays without interpreting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    /// `startGame`
    StartGame,
    /// `updateX`
    UpdateX,
    /// `setTeams`
    SetTeams,
    /// `updateTeam`
    UpdateTeam,
    /// `revealAnswer`
    RevealAnswer,
}

impl RelayKind {
    /// Relay kind for an inbound event name, if it is a relay event.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "startGame" => Some(Self::StartGame),
            "updateX" => Some(Self::UpdateX),
            "setTeams" => Some(Self::SetTeams),
            "updateTeam" => Some(Self::UpdateTeam),
            "revealAnswer" => Some(Self::RevealAnswer),
            _ => None,
        }
    }

    /// Event name used on the wire.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::StartGame => "startGame",
            Self::UpdateX => "updateX",
            Self::SetTeams => "setTeams",
            Self::UpdateTeam => "updateTeam",
            Self::RevealAnswer => "revealAnswer",
        }
    }
}

/// Opaque relay payload. The server never looks inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Passthrough {
    /// Which relay event this is.
    pub kind: RelayKind,
    /// Payload as received.
    pub payload: Value,
}

/// Broadcast after the session was rewound.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResetEvent {
    /// Epoch opened by the reset.
    pub epoch: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn relay_names_round_trip() {
        for name in ["startGame", "updateX", "setTeams", "updateTeam", "revealAnswer"] {
            let kind = RelayKind::from_event_name(name).unwrap();
            assert_eq!(kind.event_name(), name);
        }
        assert_eq!(RelayKind::from_event_name("nextQuestion"), None);
    }

    #[test]
    fn passthrough_keeps_payload_untouched() {
        let payload = json!({"answerText": "Paris", "team": "red", "extra": [1, 2]});
        let event = ServerEvent::passthrough(Passthrough {
            kind: RelayKind::RevealAnswer,
            payload: payload.clone(),
        });
        assert_eq!(event.name, "revealAnswer");
        assert_eq!(event.data, payload);
        assert_eq!(event.audience, Audience::All);
    }

    #[test]
    fn audience_filters_channels() {
        let audience = Audience::Only(vec![Channel::Display, Channel::Controller]);
        assert!(audience.includes(Channel::Display));
        assert!(!audience.includes(Channel::Guest));
        assert!(Channel::ALL.iter().all(|c| Audience::All.includes(*c)));
    }

    #[test]
    fn game_is_an_alias_for_display() {
        let channel: Channel = serde_json::from_str("\"game\"").unwrap();
        assert_eq!(channel, Channel::Display);
    }
}
