mod common;

use indexmap::IndexMap;
use quizor_back::{
    dto::{
        events::{Channel, Passthrough, RelayKind},
        guest::GuestSubmissionRequest,
    },
    services::{game_controller, scoring_service},
    state::{Subscription, buzzer::BuzzOutcome, state_machine::SessionPhase},
};
use serde_json::json;

async fn names(sub: &mut Subscription, count: usize) -> Vec<&'static str> {
    let mut received = Vec::with_capacity(count);
    for _ in 0..count {
        received.push(sub.recv().await.unwrap().name);
    }
    received
}

#[tokio::test]
async fn a_whole_evening() {
    let (state, store) = common::app_state(vec![
        common::question("q1", 0, &["x", "y", "z"]),
        common::question("q2", 1, &["a", "b"]),
    ]);
    let mut display = state.hub().subscribe(Channel::Display);

    // Guests answer from their phones before the show starts.
    let mut answers = IndexMap::new();
    answers.insert("q1".to_string(), vec!["x".to_string(), "y".to_string()]);
    scoring_service::submit_guest_answers(
        &state,
        GuestSubmissionRequest {
            name: "A".into(),
            answers,
        },
    )
    .await
    .unwrap();

    let q1 = store.question("q1").await.unwrap();
    assert_eq!(q1.total_answered, 1);
    assert_eq!(q1.answer("x").unwrap().count, 5);
    assert_eq!(q1.answer("y").unwrap().count, 4);

    // The controller opens the first question.
    let first = game_controller::start_game(&state).await.unwrap();
    assert_eq!(first.current_question_index, 1);
    assert_eq!(first.total_questions, 2);
    assert_eq!(names(&mut display, 2).await, vec!["nextQuestion", "resetBuzzer"]);

    // Two teams race; only the first is announced.
    assert!(matches!(
        game_controller::buzz(&state, "red").await.unwrap(),
        BuzzOutcome::Won { .. }
    ));
    game_controller::buzz(&state, "blue").await.unwrap();
    game_controller::relay(
        &state,
        Passthrough {
            kind: RelayKind::RevealAnswer,
            payload: json!({"answer": "x"}),
        },
    );
    let buzzed = display.recv().await.unwrap();
    assert_eq!((buzzed.name, buzzed.data), ("teamBuzzed", json!("red")));
    let reveal = display.recv().await.unwrap();
    assert_eq!((reveal.name, reveal.data), ("revealAnswer", json!({"answer": "x"})));

    // Second question, then the end, then nothing more.
    game_controller::next_question(&state).await.unwrap();
    assert_eq!(names(&mut display, 2).await, vec!["nextQuestion", "resetBuzzer"]);
    game_controller::next_question(&state).await.unwrap();
    game_controller::next_question(&state).await.unwrap();
    assert_eq!(
        names(&mut display, 2).await,
        vec!["noMoreQuestions", "noMoreQuestions"]
    );
    let ended = state.snapshot().await;
    assert_eq!(ended.phase, SessionPhase::Ended);

    // A reset starts a new epoch from the first question.
    assert_eq!(game_controller::reset_session(&state).await.unwrap(), 1);
    assert_eq!(names(&mut display, 2).await, vec!["sessionReset", "resetBuzzer"]);
    let again = game_controller::start_game(&state).await.unwrap();
    assert_eq!(again.question, "question q1");
    // Counters reflect the earlier submission.
    assert_eq!(again.answers[0].count, 5);
}

#[tokio::test]
async fn late_joiners_recover_through_the_snapshot() {
    let (state, _) = common::app_state(vec![
        common::question("q1", 0, &["x"]),
        common::question("q2", 1, &["y"]),
    ]);
    game_controller::next_question(&state).await.unwrap();
    game_controller::next_question(&state).await.unwrap();

    // Subscribed after the fact: no replay.
    let mut late = state.hub().subscribe(Channel::Display);
    let snapshot = game_controller::session_snapshot(&state).await.unwrap();
    assert_eq!(snapshot.current_question_index, Some(2));
    assert_eq!(snapshot.total_questions, 2);

    let current = game_controller::current_question(&state).await.unwrap();
    assert_eq!(current.question, "question q2");

    game_controller::reset_buzzer(&state).await;
    assert_eq!(late.recv().await.unwrap().name, "resetBuzzer");
}
