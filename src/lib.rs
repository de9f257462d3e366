//! Library crate for quizor-back, exposing modules for binaries and integration tests.

pub mod config;
/// Question catalog storage and its backends.
pub mod dao;
/// Wire types for REST bodies and real-time frames.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Session control, scoring and the real-time transports.
pub mod services;
/// In-memory session, buzzer race and broadcast hub.
pub mod state;
