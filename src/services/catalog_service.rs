use tracing::info;
use validator::Validate;

use crate::{
    dto::question::{AddQuestionRequest, AddQuestionResponse, QuestionDto},
    error::ServiceError,
    state::SharedState,
};

/// Full catalog in progression order.
pub async fn list_questions(state: &SharedState) -> Result<Vec<QuestionDto>, ServiceError> {
    let questions = state.store().list_questions().await?;
    Ok(questions.into_iter().map(QuestionDto::from).collect())
}

/// Append a question after the current last one.
pub async fn add_question(
    state: &SharedState,
    request: AddQuestionRequest,
) -> Result<AddQuestionResponse, ServiceError> {
    request.validate()?;

    let answers = request.answers.len();
    let id = state.store().insert_question(request.into()).await?;
    info!(id = %id, answers, "question added to catalog");

    Ok(AddQuestionResponse {
        message: "Question added successfully".into(),
        id,
    })
}
