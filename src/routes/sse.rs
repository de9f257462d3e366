use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{dto::ws::RoleQuery, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse",
    tag = "realtime",
    params(RoleQuery),
    responses((status = 200, description = "Read-only event stream", content_type = "text/event-stream", body = String))
)]
/// Stream real-time events to display-type clients that never send commands.
pub async fn stream(
    State(state): State<SharedState>,
    Query(query): Query<RoleQuery>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    info!(role = ?query.role, "New SSE connection");
    let subscription = state.hub().subscribe(query.role);
    sse_service::to_sse_stream(state, subscription)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(stream))
}
