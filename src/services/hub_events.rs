use serde::Serialize;

use crate::{
    dto::{
        events::{
            EVENT_NEXT_QUESTION, EVENT_NO_MORE_QUESTIONS, EVENT_RESET_BUZZER, EVENT_SESSION_RESET,
            EVENT_TEAM_BUZZED, Passthrough, ServerEvent, SessionResetEvent,
        },
        question::CurrentQuestionResponse,
        sse::SystemStatus,
    },
    state::{DropReason, SharedState},
};

const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the question that just became active.
pub fn broadcast_next_question(state: &SharedState, question: &CurrentQuestionResponse) {
    send_event(state, EVENT_NEXT_QUESTION, question);
}

/// Broadcast that the catalog is exhausted.
pub fn broadcast_no_more_questions(state: &SharedState) {
    state.broadcast(ServerEvent::signal(EVENT_NO_MORE_QUESTIONS));
}

/// Broadcast that the session was rewound and which epoch is now current.
pub fn broadcast_session_reset(state: &SharedState, epoch: u64) {
    send_event(state, EVENT_SESSION_RESET, &SessionResetEvent { epoch });
}

/// Broadcast the winner of the current buzzer round.
pub fn broadcast_team_buzzed(state: &SharedState, team: &str) {
    send_event(state, EVENT_TEAM_BUZZED, &team);
}

/// Broadcast that the buzzer race is open again.
pub fn broadcast_reset_buzzer(state: &SharedState) {
    state.broadcast(ServerEvent::signal(EVENT_RESET_BUZZER));
}

/// Forward a relay event unchanged.
pub fn broadcast_relay(state: &SharedState, relay: Passthrough) {
    state.broadcast(ServerEvent::passthrough(relay));
}

/// Broadcast the degraded flag of the question store.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &SharedState, event: &'static str, payload: &impl Serialize) {
    match ServerEvent::json(event, payload) {
        Ok(event) => state.broadcast(event),
        Err(err) => state
            .monitor()
            .event_dropped(event, DropReason::Serialization, &err.to_string()),
    }
}
