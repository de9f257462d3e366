use axum::Router;

use crate::state::SharedState;

/// Login, logout and the cookie-gated pages.
pub mod auth;
/// Catalog edits.
pub mod catalog;
/// Session progression for the controller.
pub mod controller;
/// Swagger UI.
pub mod docs;
/// Request extractors.
pub mod extract;
/// Guest listing and submissions.
pub mod guest;
/// Health check.
pub mod health;
/// Server-sent events stream.
pub mod sse;
/// WebSocket upgrade.
pub mod websocket;

/// Compose all route trees, then bind the shared state.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router(state.clone()))
        .merge(guest::router())
        .merge(controller::router())
        .merge(catalog::router())
        .merge(sse::router())
        .merge(websocket::router())
        .merge(docs::router());

    api_router.with_state(state)
}
