use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::question::{AddQuestionRequest, AddQuestionResponse},
    error::AppError,
    routes::extract::JsonBody,
    services::catalog_service,
    state::SharedState,
};

/// Catalog management.
pub fn router() -> Router<SharedState> {
    Router::new().route("/addquestion", post(add_question))
}

/// Append a question to the catalog.
#[utoipa::path(
    post,
    path = "/addquestion",
    tag = "catalog",
    request_body = AddQuestionRequest,
    responses(
        (status = 200, description = "Question stored", body = AddQuestionResponse),
        (status = 400, description = "Invalid question"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn add_question(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<AddQuestionRequest>,
) -> Result<Json<AddQuestionResponse>, AppError> {
    Ok(Json(catalog_service::add_question(&state, payload).await?))
}
