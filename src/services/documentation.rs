use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::admin_page,
        crate::routes::auth::controller_page,
        crate::routes::guest::list_questions,
        crate::routes::guest::submit_answers,
        crate::routes::controller::start_game,
        crate::routes::controller::session,
        crate::routes::catalog::add_question,
        crate::routes::sse::stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::MessageResponse,
            crate::dto::auth::PageAccessResponse,
            crate::dto::question::QuestionDto,
            crate::dto::question::AnswerDto,
            crate::dto::question::CurrentQuestionResponse,
            crate::dto::question::AddQuestionRequest,
            crate::dto::question::AddQuestionResponse,
            crate::dto::guest::GuestSubmissionRequest,
            crate::dto::guest::SubmissionResponse,
            crate::dto::phase::SessionSnapshotResponse,
            crate::dto::phase::VisibleSessionPhase,
            crate::dto::phase::BuzzerStatus,
            crate::dto::events::Channel,
            crate::dto::events::SessionResetEvent,
            crate::dto::ws::InboundFrame,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Admin login and gated pages"),
        (name = "guest", description = "Guest question listing and answer submission"),
        (name = "controller", description = "Session progression for the controller"),
        (name = "catalog", description = "Question catalog management"),
        (name = "realtime", description = "WebSocket and SSE streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_public_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/login",
            "/logout",
            "/admin",
            "/controller",
            "/guest/questions",
            "/guest/submit",
            "/controller/start-game",
            "/session",
            "/addquestion",
            "/healthcheck",
            "/ws",
            "/sse",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
