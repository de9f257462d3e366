use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade, ws::rejection::WebSocketUpgradeRejection},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::CookieJar;

use crate::{
    dto::{events::Channel, ws::RoleQuery},
    error::AppError,
    routes::auth::has_admin_session,
    services::websocket_service::{self, ClientContext},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "realtime",
    params(RoleQuery),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 403, description = "Controller role requested without an admin session")
    )
)]
/// Upgrade the HTTP connection into a real-time session for the requested role.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Query(query): Query<RoleQuery>,
    jar: CookieJar,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<impl IntoResponse, AppError> {
    let authenticated = has_admin_session(&state, &jar);
    if query.role == Channel::Controller && !authenticated {
        return Err(AppError::Forbidden(
            "the controller role requires an admin session".into(),
        ));
    }

    let ws = ws.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let client = ClientContext::new(query.role, authenticated);
    let shared_state = state.clone();
    Ok(ws.on_upgrade(move |socket| websocket_service::handle_socket(shared_state, socket, client)))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
