use indexmap::IndexMap;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::dao::models::{AnswerEntity, GuestSubmissionEntity, NewQuestionEntity, QuestionEntity};

/// Layout of a document in the `questions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoQuestionDocument {
    /// MongoDB `_id`.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Question text.
    pub text: String,
    /// Documents created before ordering existed sort first.
    #[serde(default)]
    pub order: i64,
    /// Candidate answers with their counters.
    #[serde(default)]
    pub answers: Vec<MongoAnswerDocument>,
    /// Stored as `totalAnswered`.
    #[serde(default)]
    pub total_answered: i64,
}

/// Entry of the `answers` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerDocument {
    /// Answer text.
    pub text: String,
    /// Accumulated rank weights.
    #[serde(default)]
    pub count: i64,
}

/// Layout of a document in the `guest_answers` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoSubmissionDocument {
    /// Guest display name.
    pub name: String,
    /// Ranked answer texts keyed by question id.
    pub answers: IndexMap<String, Vec<String>>,
    /// Stored as `submittedAt`.
    pub submitted_at: DateTime,
}

impl MongoQuestionDocument {
    /// Document for a new question at position `order`.
    pub fn new(question: NewQuestionEntity, order: i64) -> Self {
        Self {
            id: ObjectId::new(),
            text: question.text,
            order,
            answers: question
                .answers
                .into_iter()
                .map(|text| MongoAnswerDocument { text, count: 0 })
                .collect(),
            total_answered: 0,
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id.to_hex(),
            text: value.text,
            order: value.order,
            answers: value.answers.into_iter().map(Into::into).collect(),
            total_answered: value.total_answered,
        }
    }
}

impl From<MongoAnswerDocument> for AnswerEntity {
    fn from(value: MongoAnswerDocument) -> Self {
        Self {
            text: value.text,
            count: value.count,
        }
    }
}

impl From<GuestSubmissionEntity> for MongoSubmissionDocument {
    fn from(value: GuestSubmissionEntity) -> Self {
        Self {
            name: value.name,
            answers: value.answers,
            submitted_at: DateTime::from_system_time(value.submitted_at),
        }
    }
}
