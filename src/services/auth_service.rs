use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{config::AuthSettings, error::ServiceError, state::SharedState};

/// Name of the http-only cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";
/// Only role ever issued.
pub const ADMIN_ROLE: &str = "admin";

/// Claims of the signed session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Always `admin` for issued tokens.
    pub role: String,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Reasons a login or a session check fails.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password did not match.
    #[error("invalid password")]
    InvalidPassword,
    /// No session cookie on the request.
    #[error("missing session cookie")]
    MissingToken,
    /// Bad signature, malformed or expired token.
    #[error("invalid or expired session")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    /// Valid token for another role.
    #[error("role `{0}` may not access this resource")]
    WrongRole(String),
    /// Token could not be signed.
    #[error("failed to sign session token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Compare `candidate` with the configured admin password in constant time.
pub fn verify_password(settings: &AuthSettings, candidate: &str) -> Result<(), AuthError> {
    if constant_time_eq(settings.admin_password.as_bytes(), candidate.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidPassword)
    }
}

/// Sign an admin token issued at `issued_at` (unix seconds).
pub fn issue_token(settings: &AuthSettings, issued_at: i64) -> Result<String, AuthError> {
    let ttl = i64::try_from(settings.session_ttl.as_secs()).unwrap_or(i64::MAX);
    let claims = SessionClaims {
        role: ADMIN_ROLE.to_owned(),
        iat: issued_at,
        exp: issued_at.saturating_add(ttl),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

/// Check signature, expiry (no leeway) and role of a session token.
pub fn verify_token(settings: &AuthSettings, token: Option<&str>) -> Result<SessionClaims, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(AuthError::InvalidToken)?;

    if data.claims.role != ADMIN_ROLE {
        return Err(AuthError::WrongRole(data.claims.role));
    }
    Ok(data.claims)
}

/// Exchange the admin password for a signed session token.
pub fn login(state: &SharedState, password: &str) -> Result<String, ServiceError> {
    let settings = &state.config().auth;
    if let Err(err) = verify_password(settings, password) {
        warn!("rejected admin login attempt");
        return Err(err.into());
    }
    let token = issue_token(settings, OffsetDateTime::now_utc().unix_timestamp())?;
    info!("admin logged in");
    Ok(token)
}

/// Validate the session cookie value of a request.
pub fn authorize_admin(state: &SharedState, token: Option<&str>) -> Result<SessionClaims, ServiceError> {
    verify_token(&state.config().auth, token).map_err(|err| {
        debug!(error = %err, "admin session rejected");
        err.into()
    })
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".into(),
            admin_password: "letmein".into(),
            session_ttl: Duration::from_secs(3600),
        }
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    #[test]
    fn password_must_match_exactly() {
        assert!(verify_password(&settings(), "letmein").is_ok());
        assert!(matches!(
            verify_password(&settings(), "letmei"),
            Err(AuthError::InvalidPassword)
        ));
        assert!(verify_password(&settings(), "LETMEIN").is_err());
    }

    #[test]
    fn fresh_token_is_accepted() {
        let token = issue_token(&settings(), now()).unwrap();
        let claims = verify_token(&settings(), Some(&token)).unwrap();
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_older_than_an_hour_is_rejected() {
        let token = issue_token(&settings(), now() - 3601).unwrap();
        assert!(matches!(
            verify_token(&settings(), Some(&token)),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = AuthSettings {
            jwt_secret: "another-secret".into(),
            ..settings()
        };
        let token = issue_token(&other, now()).unwrap();
        assert!(verify_token(&settings(), Some(&token)).is_err());
    }

    #[test]
    fn missing_token_is_its_own_error() {
        assert!(matches!(
            verify_token(&settings(), None),
            Err(AuthError::MissingToken)
        ));
        assert!(verify_token(&settings(), Some("garbage")).is_err());
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert!(matches!(
            ServiceError::from(AuthError::InvalidPassword),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            ServiceError::from(AuthError::MissingToken),
            ServiceError::Forbidden(_)
        ));
    }
}
