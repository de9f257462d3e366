use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /login`.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Shared admin password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wrap `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Returned by the gated pages once the session cookie checked out.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageAccessResponse {
    /// Page that was requested.
    pub page: String,
    /// Role carried by the session cookie.
    pub role: String,
}
