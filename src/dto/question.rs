use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{AnswerEntity, NewQuestionEntity, QuestionEntity},
    dto::validation::{validate_answer_options, validate_not_blank},
};

/// Answer option with its accumulated weighted count.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AnswerDto {
    /// Answer text.
    pub text: String,
    /// Accumulated weighted count.
    pub count: i64,
}

/// Question as served to guests and screens.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    /// Catalog identifier, serialized as `_id`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Question text.
    pub text: String,
    /// Position in the progression.
    pub order: i64,
    /// Answers with their counts.
    pub answers: Vec<AnswerDto>,
    /// Submissions that referenced this question.
    pub total_answered: i64,
}

impl From<AnswerEntity> for AnswerDto {
    fn from(value: AnswerEntity) -> Self {
        Self {
            text: value.text,
            count: value.count,
        }
    }
}

impl From<QuestionEntity> for QuestionDto {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            order: value.order,
            answers: value.answers.into_iter().map(Into::into).collect(),
            total_answered: value.total_answered,
        }
    }
}

/// Question at the session position together with pagination metadata.
///
/// Used both as the `GET /controller/start-game` body and as the
/// `nextQuestion` broadcast payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuestionResponse {
    /// Question text.
    pub question: String,
    /// Answers with their counts, in display order.
    pub answers: Vec<AnswerDto>,
    /// Catalog length at the time of the move.
    pub total_questions: usize,
    /// 1-based.
    pub current_question_index: usize,
}

impl CurrentQuestionResponse {
    /// Build the payload for the question at 0-based `index`.
    pub fn new(question: QuestionEntity, index: usize, total_questions: usize) -> Self {
        Self {
            question: question.text,
            answers: question.answers.into_iter().map(Into::into).collect(),
            total_questions,
            current_question_index: index + 1,
        }
    }
}

/// Body of `POST /addquestion`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddQuestionRequest {
    /// Question text; must not be blank.
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
    /// Answer options; non-empty, no blanks, no duplicates.
    #[validate(custom(function = "validate_answer_options"))]
    pub answers: Vec<String>,
}

impl From<AddQuestionRequest> for NewQuestionEntity {
    fn from(value: AddQuestionRequest) -> Self {
        Self {
            text: value.text.trim().to_owned(),
            answers: value.answers,
        }
    }
}

/// Response of `POST /addquestion`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddQuestionResponse {
    /// Confirmation text.
    pub message: String,
    /// Identifier assigned by the catalog.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn question() -> QuestionEntity {
        QuestionEntity {
            id: "q1".into(),
            text: "Capital of France?".into(),
            order: 0,
            answers: vec![AnswerEntity {
                text: "Paris".into(),
                count: 9,
            }],
            total_answered: 2,
        }
    }

    #[test]
    fn question_serialises_with_mongo_style_id() {
        let value = serde_json::to_value(QuestionDto::from(question())).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "q1",
                "text": "Capital of France?",
                "order": 0,
                "answers": [{"text": "Paris", "count": 9}],
                "totalAnswered": 2
            })
        );
    }

    #[test]
    fn current_question_index_is_one_based() {
        let response = CurrentQuestionResponse::new(question(), 0, 3);
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["currentQuestionIndex"], 1);
        assert_eq!(value["totalQuestions"], 3);
        assert_eq!(value["question"], "Capital of France?");
    }

    #[test]
    fn add_question_request_is_validated() {
        let ok: AddQuestionRequest =
            serde_json::from_value(json!({"text": "Q", "answers": ["a", "b"]})).unwrap();
        assert!(ok.validate().is_ok());

        let blank: AddQuestionRequest =
            serde_json::from_value(json!({"text": " ", "answers": ["a"]})).unwrap();
        assert!(blank.validate().is_err());

        let no_answers: AddQuestionRequest =
            serde_json::from_value(json!({"text": "Q", "answers": []})).unwrap();
        assert!(no_answers.validate().is_err());
    }
}
