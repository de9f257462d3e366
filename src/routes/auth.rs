use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    dto::auth::{LoginRequest, MessageResponse, PageAccessResponse},
    error::AppError,
    routes::extract::JsonBody,
    services::auth_service::{self, SESSION_COOKIE, SessionClaims},
    state::SharedState,
};

/// Login, logout and the cookie-gated pages.
pub fn router(state: SharedState) -> Router<SharedState> {
    let gated = Router::new()
        .route("/admin", get(admin_page))
        .route("/controller", get(controller_page))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .merge(gated)
}

/// Exchange the admin password for a session cookie.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = MessageResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Wrong password")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let token = auth_service::login(&state, &payload.password)?;
    let max_age = time::Duration::try_from(state.config().auth.session_ttl)
        .unwrap_or(time::Duration::HOUR);
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();

    Ok((
        jar.add(cookie),
        Json(MessageResponse::new("Logged in successfully")),
    ))
}

/// Drop the session cookie and send the browser back to the login page.
#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses((status = 303, description = "Cookie cleared, redirect to /login.html"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/login.html"))
}

/// Admin page access check.
#[utoipa::path(
    get,
    path = "/admin",
    tag = "auth",
    responses(
        (status = 200, description = "Session valid", body = PageAccessResponse),
        (status = 403, description = "Missing, invalid or expired session cookie")
    )
)]
pub async fn admin_page(claims: axum::Extension<SessionClaims>) -> Json<PageAccessResponse> {
    Json(PageAccessResponse {
        page: "admin".into(),
        role: claims.role.clone(),
    })
}

/// Controller page access check.
#[utoipa::path(
    get,
    path = "/controller",
    tag = "auth",
    responses(
        (status = 200, description = "Session valid", body = PageAccessResponse),
        (status = 403, description = "Missing, invalid or expired session cookie")
    )
)]
pub async fn controller_page(claims: axum::Extension<SessionClaims>) -> Json<PageAccessResponse> {
    Json(PageAccessResponse {
        page: "controller".into(),
        role: claims.role.clone(),
    })
}

/// Reject requests without a valid admin session cookie.
async fn require_admin(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = {
        let jar = CookieJar::from_headers(req.headers());
        auth_service::authorize_admin(&state, jar.get(SESSION_COOKIE).map(Cookie::value))?
    };
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Whether the request carries a valid admin session cookie.
pub fn has_admin_session(state: &SharedState, jar: &CookieJar) -> bool {
    auth_service::authorize_admin(state, jar.get(SESSION_COOKIE).map(Cookie::value)).is_ok()
}
