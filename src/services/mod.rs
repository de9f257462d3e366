/// Admin login and session cookie verification.
pub mod auth_service;
/// Question catalog reads and inserts.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Session progression, buzzer race and relays.
pub mod game_controller;
/// Health check service.
pub mod health_service;
/// Real-time event construction and fan-out.
pub mod hub_events;
/// Guest submission scoring.
pub mod scoring_service;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Store health polling and degraded mode.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
