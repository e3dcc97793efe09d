// handlers/public/login.rs - POST /auth/login handler

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::{session_cookie_header, ApiResponse};
use crate::platform::Session;
use crate::ratelimit::fingerprint;
use crate::services::LoginError;
use crate::state::AppState;

/// Where the admin UI goes after a successful sign-in
const ADMIN_REDIRECT: &str = "/admin";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub session: Session,
    pub redirect: &'static str,
}

/// POST /auth/login - rate-limited password sign-in
///
/// Expected Input:
/// ```json
/// { "email": "admin@sogrub.es", "password": "..." }
/// ```
///
/// Success returns the session, sets the `HttpOnly` session cookie and tells the
/// browser to drop cached views. Bad credentials of any kind answer 401 with the
/// same message; a client over its attempt budget gets 429 with `Retry-After`.
pub async fn login_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Response {
    let identifier = fingerprint(&headers);

    match state.auth.authenticate(&identifier, &body.email, &body.password).await {
        Ok(session) => {
            let cookie = session_cookie_header(&state.config.security, &session.access_token, session.expires_in);
            let no_cache: [(HeaderName, String); 3] = [
                (header::SET_COOKIE, cookie),
                (header::CACHE_CONTROL, "no-store".to_string()),
                (HeaderName::from_static("clear-site-data"), "\"cache\"".to_string()),
            ];

            let body = LoginResponse {
                session,
                redirect: ADMIN_REDIRECT,
            };
            (no_cache, ApiResponse::success(body)).into_response()
        }
        Err(LoginError::RateLimited { retry_after }) => {
            let seconds = retry_after.as_secs().max(1).to_string();
            let error = ApiError::from(LoginError::RateLimited { retry_after });
            ([(header::RETRY_AFTER, seconds)], error).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
