#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use quizor_back::{
    config::{AppConfig, GameSettings},
    dao::{
        models::{AnswerEntity, QuestionEntity},
        question_store::memory::MemoryQuestionStore,
    },
    state::{AppState, SharedState},
};

pub const ADMIN_PASSWORD: &str = "letmein";

pub fn config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("QUIZOR_JWT_SECRET", "integration-secret"),
        ("QUIZOR_ADMIN_PASSWORD", ADMIN_PASSWORD),
        ("MONGO_URI", "mongodb://localhost:27017"),
    ]);
    AppConfig::from_lookup(GameSettings::default(), move |name: &str| {
        vars.get(name).map(|value| value.to_string())
    })
    .unwrap()
}

pub fn question(id: &str, order: i64, answers: &[&str]) -> QuestionEntity {
    QuestionEntity {
        id: id.into(),
        text: format!("question {id}"),
        order,
        answers: answers
            .iter()
            .map(|text| AnswerEntity {
                text: text.to_string(),
                count: 0,
            })
            .collect(),
        total_answered: 0,
    }
}

pub fn app_state(questions: Vec<QuestionEntity>) -> (SharedState, MemoryQuestionStore) {
    let store = MemoryQuestionStore::with_questions(questions);
    let state = AppState::new(config(), Arc::new(store.clone()));
    (state, store)
}
