use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{phase::SessionSnapshotResponse, question::CurrentQuestionResponse},
    error::AppError,
    services::game_controller,
    state::SharedState,
};

/// Session pull endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/controller/start-game", get(start_game))
        .route("/session", get(session))
}

/// Start the session if idle and return the question on screen.
#[utoipa::path(
    get,
    path = "/controller/start-game",
    tag = "controller",
    responses(
        (status = 200, description = "Current question", body = CurrentQuestionResponse),
        (status = 404, description = "No more questions"),
        (status = 409, description = "A transition is already in progress"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<CurrentQuestionResponse>, AppError> {
    Ok(Json(game_controller::start_game(&state).await?))
}

/// Snapshot of the live session for clients that reconnect.
#[utoipa::path(
    get,
    path = "/session",
    tag = "controller",
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshotResponse),
        (status = 500, description = "Store failure")
    )
)]
pub async fn session(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshotResponse>, AppError> {
    Ok(Json(game_controller::session_snapshot(&state).await?))
}
