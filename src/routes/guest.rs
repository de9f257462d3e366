use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        guest::{GuestSubmissionRequest, SubmissionResponse},
        question::QuestionDto,
    },
    error::AppError,
    routes::extract::JsonBody,
    services::{catalog_service, scoring_service},
    state::SharedState,
};

/// Guest-facing endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/guest/questions", get(list_questions))
        .route("/guest/submit", post(submit_answers))
}

/// Full catalog, ordered by `order`.
#[utoipa::path(
    get,
    path = "/guest/questions",
    tag = "guest",
    responses(
        (status = 200, description = "Question catalog", body = [QuestionDto]),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionDto>>, AppError> {
    Ok(Json(catalog_service::list_questions(&state).await?))
}

/// Record a guest's ranked answers.
#[utoipa::path(
    post,
    path = "/guest/submit",
    tag = "guest",
    request_body = GuestSubmissionRequest,
    responses(
        (status = 200, description = "Submission recorded", body = SubmissionResponse),
        (status = 400, description = "Structurally invalid body"),
        (status = 500, description = "Store failure, possibly after some counters were updated")
    )
)]
pub async fn submit_answers(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<GuestSubmissionRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    Ok(Json(scoring_service::submit_guest_answers(&state, payload).await?))
}
