use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::events::Channel,
    state::{buzzer::BuzzerRace, state_machine::SessionPhase},
};

/// Session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// No question shown yet.
    Idle,
    /// A question is on screen.
    QuestionActive,
    /// The controller asked for a transition that is still being resolved.
    AwaitingNext,
    /// Catalog exhausted.
    Ended,
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => Self::Idle,
            SessionPhase::QuestionActive => Self::QuestionActive,
            SessionPhase::AwaitingNext => Self::AwaitingNext,
            SessionPhase::Ended => Self::Ended,
        }
    }
}

/// Buzzer race status.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct BuzzerStatus {
    /// Whether a team already won this round.
    pub locked: bool,
    /// Winning team, when locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    /// Incremented by every buzzer reset.
    pub round: u64,
}

impl From<&BuzzerRace> for BuzzerStatus {
    fn from(race: &BuzzerRace) -> Self {
        Self {
            locked: race.is_locked(),
            winner: race.winner().map(str::to_owned),
            round: race.round(),
        }
    }
}

/// Pull snapshot used by clients that reconnect and missed broadcasts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotResponse {
    /// Current phase.
    pub phase: VisibleSessionPhase,
    /// 1-based position of the current question, absent before the first start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    /// Catalog length right now.
    pub total_questions: usize,
    /// Catalog length fetched when the session started; absent until then and after a reset.
    /// Differs from `total_questions` when questions were added or removed mid-session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions_at_start: Option<usize>,
    /// Incremented on every session reset.
    pub epoch: u64,
    /// Incremented on every effective transition.
    pub version: u64,
    /// Buzzer race status.
    pub buzzer: BuzzerStatus,
    /// Real-time connections currently open.
    pub connected_clients: usize,
    /// Open connections per role, e.g. whether a controller is attached.
    #[schema(value_type = Object)]
    pub connected_roles: IndexMap<Channel, usize>,
}
