//! Real-time wire format: `{"event": <name>, "data": <payload>}` in both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::dto::events::{Channel, Passthrough, RelayKind};

/// Raw frame as received from a client.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct InboundFrame {
    /// Event name.
    pub event: String,
    /// Payload; `null` when absent.
    #[serde(default)]
    pub data: Value,
}

/// Frame sent to clients.
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a, T: Serialize> {
    /// Event name.
    pub event: &'a str,
    /// Event payload.
    pub data: &'a T,
}

/// Commands understood by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Ask for a random question, answered to the requester only.
    GetQuestion,
    /// Advance the session (controller only).
    NextQuestion,
    /// Rewind the session to its first question (controller only).
    ResetSession,
    /// A team hit its buzzer.
    TeamBuzzed { team: String },
    /// Reopen the buzzer race.
    ResetBuzzer,
    /// Forwarded to everyone without interpretation.
    Relay(Passthrough),
}

impl ClientMessage {
    /// Whether only authenticated controllers may issue this command.
    pub fn requires_controller(&self) -> bool {
        matches!(self, Self::NextQuestion | Self::ResetSession)
    }

    /// Inbound event name, used when reporting drops.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::GetQuestion => "getQuestion",
            Self::NextQuestion => "nextQuestion",
            Self::ResetSession => "resetSession",
            Self::TeamBuzzed { .. } => "teamBuzzed",
            Self::ResetBuzzer => "resetBuzzer",
            Self::Relay(relay) => relay.kind.event_name(),
        }
    }
}

/// Reasons an inbound frame is discarded.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Not a JSON `{event, data}` object.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Event name the server does not know.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    /// Known event with an unusable payload.
    #[error("invalid payload for `{event}`: {reason}")]
    InvalidPayload { event: String, reason: String },
}

impl TryFrom<InboundFrame> for ClientMessage {
    type Error = InboundError;

    fn try_from(frame: InboundFrame) -> Result<Self, Self::Error> {
        let message = match frame.event.as_str() {
            "getQuestion" => Self::GetQuestion,
            "nextQuestion" => Self::NextQuestion,
            "resetSession" => Self::ResetSession,
            "resetBuzzer" => Self::ResetBuzzer,
            "teamBuzzed" => Self::TeamBuzzed {
                team: team_from_payload(&frame.data).ok_or_else(|| {
                    InboundError::InvalidPayload {
                        event: frame.event.clone(),
                        reason: "expected a non-blank team identifier".into(),
                    }
                })?,
            },
            other => match RelayKind::from_event_name(other) {
                Some(kind) => Self::Relay(Passthrough {
                    kind,
                    payload: frame.data,
                }),
                None => return Err(InboundError::UnknownEvent(frame.event)),
            },
        };
        Ok(message)
    }
}

/// Decode a text frame into a command.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, InboundError> {
    let frame: InboundFrame = serde_json::from_str(text)?;
    ClientMessage::try_from(frame)
}

// Buzzer firmware sends either a bare string/number or `{"team": ...}`.
fn team_from_payload(data: &Value) -> Option<String> {
    let team = match data {
        Value::String(team) => team.trim().to_owned(),
        Value::Number(number) => number.to_string(),
        Value::Object(map) => return map.get("team").and_then(team_from_payload),
        _ => return None,
    };
    (!team.is_empty()).then_some(team)
}

/// Query string of `/ws` and `/sse`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    /// Role of the connecting client, `display` when omitted.
    #[serde(default)]
    pub role: Channel,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn commands_without_payload_parse() {
        assert_eq!(
            parse_client_message(r#"{"event":"getQuestion"}"#).unwrap(),
            ClientMessage::GetQuestion
        );
        assert_eq!(
            parse_client_message(r#"{"event":"nextQuestion","data":null}"#).unwrap(),
            ClientMessage::NextQuestion
        );
    }

    #[test]
    fn team_buzzed_accepts_string_number_or_object() {
        for raw in [
            r#"{"event":"teamBuzzed","data":"red"}"#,
            r#"{"event":"teamBuzzed","data":{"team":"red"}}"#,
        ] {
            assert_eq!(
                parse_client_message(raw).unwrap(),
                ClientMessage::TeamBuzzed { team: "red".into() }
            );
        }
        assert_eq!(
            parse_client_message(r#"{"event":"teamBuzzed","data":2}"#).unwrap(),
            ClientMessage::TeamBuzzed { team: "2".into() }
        );
    }

    #[test]
    fn blank_team_is_rejected() {
        let err = parse_client_message(r#"{"event":"teamBuzzed","data":"  "}"#).unwrap_err();
        assert!(matches!(err, InboundError::InvalidPayload { .. }));
        let err = parse_client_message(r#"{"event":"teamBuzzed"}"#).unwrap_err();
        assert!(matches!(err, InboundError::InvalidPayload { .. }));
    }

    #[test]
    fn relay_events_keep_their_payload() {
        let message =
            parse_client_message(r#"{"event":"updateTeam","data":{"name":"red","score":[1,2]}}"#)
                .unwrap();
        assert_eq!(
            message,
            ClientMessage::Relay(Passthrough {
                kind: RelayKind::UpdateTeam,
                payload: json!({"name": "red", "score": [1, 2]}),
            })
        );
    }

    #[test]
    fn unknown_and_malformed_frames_are_errors() {
        assert!(matches!(
            parse_client_message(r#"{"event":"dropTables"}"#),
            Err(InboundError::UnknownEvent(name)) if name == "dropTables"
        ));
        assert!(matches!(
            parse_client_message("not json"),
            Err(InboundError::Malformed(_))
        ));
    }

    #[test]
    fn only_progression_commands_need_a_controller() {
        assert!(ClientMessage::NextQuestion.requires_controller());
        assert!(ClientMessage::ResetSession.requires_controller());
        assert!(!ClientMessage::ResetBuzzer.requires_controller());
        assert!(!ClientMessage::GetQuestion.requires_controller());
    }
}
