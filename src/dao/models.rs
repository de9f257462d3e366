use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Question stored in the catalog, with its per-answer counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Opaque backend identifier (hex ObjectId for MongoDB).
    pub id: String,
    /// Question text shown on the game display.
    pub text: String,
    /// Position in the progression, ascending.
    pub order: i64,
    /// Candidate answers in display order.
    pub answers: Vec<AnswerEntity>,
    /// Number of guest submissions that referenced this question.
    pub total_answered: i64,
}

impl QuestionEntity {
    /// Look up an answer by exact text equality.
    pub fn answer(&self, text: &str) -> Option<&AnswerEntity> {
        self.answers.iter().find(|answer| answer.text == text)
    }
}

/// Single answer of a question and its accumulated weighted count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Answer text, matched exactly against ranked submissions.
    pub text: String,
    /// Accumulated rank weights.
    pub count: i64,
}

/// Data required to append a question to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionEntity {
    /// Question text, already trimmed.
    pub text: String,
    /// Answer texts; counters start at zero.
    pub answers: Vec<String>,
}

/// Write-once record of a guest submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestSubmissionEntity {
    /// Display name typed by the guest. Not unique.
    pub name: String,
    /// Ranked answer texts keyed by question id, rank 1 first.
    pub answers: IndexMap<String, Vec<String>>,
    /// Server time at which the submission was accepted.
    pub submitted_at: SystemTime,
}
