//! Session progression, buzzer arbitration and relays.
//!
//! Every mutation of the live session goes through this module so the order in
//! which events are broadcast matches the order in which state changed.

use tracing::{debug, info};

use crate::{
    dao::models::QuestionEntity,
    dto::{
        events::Passthrough,
        phase::{BuzzerStatus, SessionSnapshotResponse},
        question::{CurrentQuestionResponse, QuestionDto},
    },
    error::ServiceError,
    services::hub_events,
    state::{
        SharedState,
        buzzer::BuzzOutcome,
        state_machine::{SessionEvent, SessionPhase, Transition},
    },
};

/// Result of a start or advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A question is now on screen.
    Question(CurrentQuestionResponse),
    /// The index went past the catalog end.
    Exhausted,
}

/// `GET /controller/start-game`: start an idle session, or return the question
/// already on screen.
pub async fn start_game(state: &SharedState) -> Result<CurrentQuestionResponse, ServiceError> {
    match state.snapshot().await.phase {
        SessionPhase::QuestionActive => return current_question(state).await,
        SessionPhase::Ended => return Err(no_more_questions()),
        SessionPhase::Idle | SessionPhase::AwaitingNext => {}
    }

    match progress(state, SessionEvent::Start).await {
        Ok(Progress::Question(question)) => Ok(question),
        Ok(Progress::Exhausted) => Err(no_more_questions()),
        // Another request started the session while this one waited on the gate.
        Err(ServiceError::InvalidState(_))
            if state.snapshot().await.phase == SessionPhase::QuestionActive =>
        {
            current_question(state).await
        }
        Err(err) => Err(err),
    }
}

/// Move to the next question in catalog order.
///
/// Advancing past the last question ends the session; advancing an ended
/// session changes nothing and announces `noMoreQuestions` again.
pub async fn next_question(state: &SharedState) -> Result<Progress, ServiceError> {
    progress(state, SessionEvent::Advance).await
}

/// Rewind the session to index 0, open a new epoch and reopen the buzzer race.
pub async fn reset_session(state: &SharedState) -> Result<u64, ServiceError> {
    let ((), transition) = state
        .run_transition(SessionEvent::Reset, || async { Ok::<_, ServiceError>(((), 0)) })
        .await?;
    let epoch = state.snapshot().await.epoch;
    info!(from = ?transition.from, epoch, "session reset");

    hub_events::broadcast_session_reset(state, epoch);
    reopen_buzzer(state).await;
    Ok(epoch)
}

/// Register a buzz; only the first one since the last reset is broadcast.
pub async fn buzz(state: &SharedState, team: &str) -> Result<BuzzOutcome, ServiceError> {
    let team = team.trim();
    if team.is_empty() {
        return Err(ServiceError::InvalidInput("team identifier must not be blank".into()));
    }

    let mut race = state.buzzer().lock().await;
    let outcome = race.buzz(team);
    match &outcome {
        BuzzOutcome::Won { team, round } => {
            info!(team = %team, round, "team buzzed first");
            hub_events::broadcast_team_buzzed(state, team);
        }
        BuzzOutcome::AlreadyLocked { winner, round } => {
            debug!(team = %team, winner = %winner, round, "late buzz ignored");
        }
    }
    Ok(outcome)
}

/// Clear the buzzer winner and announce it. Returns the new round number.
pub async fn reset_buzzer(state: &SharedState) -> u64 {
    reopen_buzzer(state).await
}

/// Forward a relay event to every client without looking at it.
pub fn relay(state: &SharedState, relay: Passthrough) {
    debug!(event = relay.kind.event_name(), "relaying event");
    hub_events::broadcast_relay(state, relay);
}

/// One question drawn uniformly from the whole catalog. Session state is untouched.
pub async fn random_question(state: &SharedState) -> Result<QuestionDto, ServiceError> {
    state
        .store()
        .sample_question()
        .await?
        .map(QuestionDto::from)
        .ok_or_else(|| ServiceError::NotFound("the question catalog is empty".into()))
}

/// Question at the session position with pagination metadata.
pub async fn current_question(state: &SharedState) -> Result<CurrentQuestionResponse, ServiceError> {
    let snapshot = state.snapshot().await;
    if snapshot.phase == SessionPhase::Ended {
        return Err(no_more_questions());
    }

    let questions = state.store().list_questions().await?;
    let total = questions.len();
    questions
        .into_iter()
        .nth(snapshot.current_question_index)
        .map(|question| CurrentQuestionResponse::new(question, snapshot.current_question_index, total))
        .ok_or_else(no_more_questions)
}

/// Pull snapshot for clients that missed broadcasts.
pub async fn session_snapshot(state: &SharedState) -> Result<SessionSnapshotResponse, ServiceError> {
    let total_questions = state.store().list_questions().await?.len();
    let snapshot = state.snapshot().await;
    let buzzer = BuzzerStatus::from(&*state.buzzer().lock().await);

    Ok(SessionSnapshotResponse {
        phase: snapshot.phase.into(),
        current_question_index: (snapshot.phase == SessionPhase::QuestionActive)
            .then_some(snapshot.current_question_index + 1),
        total_questions,
        total_questions_at_start: snapshot.catalog_len_at_start,
        epoch: snapshot.epoch,
        version: snapshot.version,
        buzzer,
        connected_clients: state.client_count(),
        connected_roles: state.clients_by_role(),
    })
}

async fn progress(state: &SharedState, event: SessionEvent) -> Result<Progress, ServiceError> {
    let store = state.store();
    let (questions, transition) = state
        .run_transition(event, || async move {
            // Re-read on every move so catalog edits made mid-session are honoured.
            let questions = store.list_questions().await?;
            let len = questions.len();
            Ok::<_, ServiceError>((questions, len))
        })
        .await?;

    let progress = resolve(questions, transition)?;
    match &progress {
        Progress::Question(question) => {
            info!(
                index = question.current_question_index,
                total = question.total_questions,
                "question activated"
            );
            // A buzz reacting to this question waits on the race lock until the race is reopened.
            let mut race = state.buzzer().lock().await;
            race.reset();
            hub_events::broadcast_next_question(state, question);
            hub_events::broadcast_reset_buzzer(state);
        }
        Progress::Exhausted => {
            info!(changed = transition.changed, "no more questions");
            hub_events::broadcast_no_more_questions(state);
        }
    }
    Ok(progress)
}

fn resolve(questions: Vec<QuestionEntity>, transition: Transition) -> Result<Progress, ServiceError> {
    if transition.to != SessionPhase::QuestionActive {
        return Ok(Progress::Exhausted);
    }
    let total = questions.len();
    questions
        .into_iter()
        .nth(transition.index)
        .map(|question| Progress::Question(CurrentQuestionResponse::new(question, transition.index, total)))
        .ok_or_else(no_more_questions)
}

async fn reopen_buzzer(state: &SharedState) -> u64 {
    let mut race = state.buzzer().lock().await;
    let round = race.reset();
    hub_events::broadcast_reset_buzzer(state);
    round
}

fn no_more_questions() -> ServiceError {
    ServiceError::NotFound("no more questions".into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        dao::{
            models::AnswerEntity,
            question_store::{flaky::FlakyStore, memory::MemoryQuestionStore},
        },
        dto::events::{Channel, RelayKind, ServerEvent},
        state::{AppState, Subscription, test_support},
    };

    fn question(id: &str, order: i64) -> QuestionEntity {
        QuestionEntity {
            id: id.into(),
            text: format!("text {id}"),
            order,
            answers: vec![AnswerEntity {
                text: "a".into(),
                count: 0,
            }],
            total_answered: 0,
        }
    }

    fn setup(questions: Vec<QuestionEntity>) -> (SharedState, MemoryQuestionStore) {
        let store = MemoryQuestionStore::with_questions(questions);
        let state = AppState::new(test_support::config(), Arc::new(store.clone()));
        (state, store)
    }

    fn two_questions() -> (SharedState, MemoryQuestionStore) {
        setup(vec![question("q1", 0), question("q2", 1)])
    }

    async fn next_event(sub: &mut Subscription) -> ServerEvent {
        sub.recv().await.expect("event")
    }

    #[tokio::test]
    async fn advancing_walks_the_catalog_then_ends() {
        let (state, _) = two_questions();

        let Progress::Question(first) = next_question(&state).await.unwrap() else {
            panic!("expected first question");
        };
        assert_eq!(first.question, "text q1");
        assert_eq!(first.current_question_index, 1);

        let Progress::Question(second) = next_question(&state).await.unwrap() else {
            panic!("expected second question");
        };
        assert_eq!(second.question, "text q2");
        assert_eq!(second.current_question_index, 2);
        assert_eq!(second.total_questions, 2);

        assert_eq!(next_question(&state).await.unwrap(), Progress::Exhausted);
        let ended = state.snapshot().await;
        assert_eq!(ended.phase, SessionPhase::Ended);
        assert_eq!(ended.current_question_index, 2);

        assert_eq!(next_question(&state).await.unwrap(), Progress::Exhausted);
        assert_eq!(state.snapshot().await, ended);
    }

    #[tokio::test]
    async fn next_question_is_followed_by_reset_buzzer() {
        let (state, _) = two_questions();
        let mut display = state.hub().subscribe(Channel::Display);

        next_question(&state).await.unwrap();

        let event = next_event(&mut display).await;
        assert_eq!(event.name, "nextQuestion");
        assert_eq!(event.data["question"], "text q1");
        assert_eq!(event.data["currentQuestionIndex"], 1);
        assert_eq!(event.data["totalQuestions"], 2);
        assert_eq!(event.data["answers"], json!([{"text": "a", "count": 0}]));
        assert_eq!(next_event(&mut display).await.name, "resetBuzzer");
    }

    #[tokio::test]
    async fn exhausted_catalog_is_announced_each_time() {
        let (state, _) = setup(vec![]);
        let mut buzzer = state.hub().subscribe(Channel::Buzzer);

        assert_eq!(next_question(&state).await.unwrap(), Progress::Exhausted);
        assert_eq!(next_question(&state).await.unwrap(), Progress::Exhausted);
        assert_eq!(next_event(&mut buzzer).await.name, "noMoreQuestions");
        assert_eq!(next_event(&mut buzzer).await.name, "noMoreQuestions");
    }

    #[tokio::test]
    async fn catalog_edits_are_seen_on_the_next_advance() {
        let (state, store) = two_questions();
        next_question(&state).await.unwrap();

        store.set_order("q1", 5).await;
        let Progress::Question(next) = next_question(&state).await.unwrap() else {
            panic!("expected a question");
        };
        // Index 1 of [q2, q1].
        assert_eq!(next.question, "text q1");
    }

    #[tokio::test]
    async fn store_failure_leaves_the_session_unchanged() {
        let store = MemoryQuestionStore::with_questions(vec![question("q1", 0)]);
        let state = AppState::new(test_support::config(), Arc::new(FlakyStore::new(store, 0)));

        assert!(matches!(
            next_question(&state).await,
            Err(ServiceError::Unavailable(_))
        ));
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert_eq!(snapshot.version, 0);
    }

    #[tokio::test]
    async fn start_game_is_idempotent_while_a_question_is_active() {
        let (state, _) = two_questions();
        let first = start_game(&state).await.unwrap();
        let again = start_game(&state).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(state.snapshot().await.version, 1);
    }

    #[tokio::test]
    async fn start_game_after_the_end_is_not_found() {
        let (state, _) = setup(vec![question("q1", 0)]);
        start_game(&state).await.unwrap();
        next_question(&state).await.unwrap();
        assert!(matches!(
            start_game(&state).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reset_rewinds_and_bumps_the_epoch() {
        let (state, _) = two_questions();
        next_question(&state).await.unwrap();
        next_question(&state).await.unwrap();
        buzz(&state, "red").await.unwrap();

        let mut controller = state.hub().subscribe(Channel::Controller);
        assert_eq!(reset_session(&state).await.unwrap(), 1);

        let reset = next_event(&mut controller).await;
        assert_eq!(reset.name, "sessionReset");
        assert_eq!(reset.data, json!({"epoch": 1}));
        assert_eq!(next_event(&mut controller).await.name, "resetBuzzer");

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert_eq!(snapshot.current_question_index, 0);
        assert!(!state.buzzer().lock().await.is_locked());
        assert_eq!(session_snapshot(&state).await.unwrap().total_questions_at_start, None);

        let Progress::Question(first) = next_question(&state).await.unwrap() else {
            panic!("expected first question after reset");
        };
        assert_eq!(first.question, "text q1");
    }

    #[tokio::test]
    async fn only_the_first_buzz_is_broadcast() {
        let (state, _) = two_questions();
        let mut display = state.hub().subscribe(Channel::Display);

        assert!(matches!(
            buzz(&state, "red").await.unwrap(),
            BuzzOutcome::Won { .. }
        ));
        assert!(matches!(
            buzz(&state, "blue").await.unwrap(),
            BuzzOutcome::AlreadyLocked { ref winner, .. } if winner == "red"
        ));
        reset_buzzer(&state).await;

        let won = next_event(&mut display).await;
        assert_eq!(won.name, "teamBuzzed");
        assert_eq!(won.data, json!("red"));
        // The late buzz produced nothing; the next event is the reset.
        assert_eq!(next_event(&mut display).await.name, "resetBuzzer");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_buzzes_have_exactly_one_winner() {
        let (state, _) = two_questions();
        let mut display = state.hub().subscribe(Channel::Display);

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let state = state.clone();
                let team = format!("team{i}");
                tokio::spawn(async move { buzz(&state, &team).await })
            })
            .collect();
        let mut winners = Vec::new();
        for task in tasks {
            if let BuzzOutcome::Won { team, .. } = task.await.unwrap().unwrap() {
                winners.push(team);
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(state.buzzer().lock().await.winner(), Some(winners[0].as_str()));

        reset_buzzer(&state).await;
        let won = next_event(&mut display).await;
        assert_eq!(won.name, "teamBuzzed");
        assert_eq!(won.data, json!(winners[0]));
        assert_eq!(next_event(&mut display).await.name, "resetBuzzer");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn buzz_sent_on_seeing_the_question_is_kept() {
        let (state, _) = two_questions();
        let mut buzzer_station = state.hub().subscribe(Channel::Buzzer);

        let station = {
            let state = state.clone();
            tokio::spawn(async move {
                loop {
                    if next_event(&mut buzzer_station).await.name == "nextQuestion" {
                        return buzz(&state, "red").await;
                    }
                }
            })
        };

        next_question(&state).await.unwrap();
        assert!(matches!(
            station.await.unwrap().unwrap(),
            BuzzOutcome::Won { ref team, .. } if team == "red"
        ));
        let race = state.buzzer().lock().await;
        assert!(race.is_locked());
        assert_eq!(race.winner(), Some("red"));
    }

    #[tokio::test]
    async fn blank_team_is_rejected() {
        let (state, _) = two_questions();
        assert!(matches!(
            buzz(&state, "   ").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(!state.buzzer().lock().await.is_locked());
    }

    #[tokio::test]
    async fn new_question_reopens_the_buzzer() {
        let (state, _) = two_questions();
        next_question(&state).await.unwrap();
        buzz(&state, "red").await.unwrap();
        next_question(&state).await.unwrap();
        assert!(matches!(
            buzz(&state, "blue").await.unwrap(),
            BuzzOutcome::Won { ref team, .. } if team == "blue"
        ));
    }

    #[tokio::test]
    async fn relay_payload_is_forwarded_verbatim() {
        let (state, _) = two_questions();
        let mut guest = state.hub().subscribe(Channel::Guest);
        let payload = json!({"teams": [{"name": "red", "score": 3}], "anything": null});

        relay(
            &state,
            Passthrough {
                kind: RelayKind::SetTeams,
                payload: payload.clone(),
            },
        );

        let event = next_event(&mut guest).await;
        assert_eq!(event.name, "setTeams");
        assert_eq!(event.data, payload);
    }

    #[tokio::test]
    async fn random_question_does_not_touch_the_session() {
        let (state, _) = two_questions();
        let question = random_question(&state).await.unwrap();
        assert!(question.id == "q1" || question.id == "q2");
        assert_eq!(state.snapshot().await.version, 0);

        let (empty, _) = setup(vec![]);
        assert!(matches!(
            random_question(&empty).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_reports_position_and_buzzer() {
        let (state, store) = two_questions();
        next_question(&state).await.unwrap();
        buzz(&state, "green").await.unwrap();
        store.remove_question("q2").await;

        let snapshot = session_snapshot(&state).await.unwrap();
        assert_eq!(snapshot.current_question_index, Some(1));
        assert_eq!(snapshot.total_questions, 1);
        assert_eq!(snapshot.total_questions_at_start, Some(2));
        assert_eq!(snapshot.buzzer.winner.as_deref(), Some("green"));
        assert_eq!(snapshot.connected_clients, 0);
        assert!(snapshot.connected_roles.values().all(|count| *count == 0));
        assert_eq!(snapshot.connected_roles.len(), Channel::ALL.len());
    }
}
