use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::{clear_session_cookie_header, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub id: String,
    pub email: Option<String>,
}

/// GET /api/auth/whoami - user behind the current session
pub async fn session_whoami(Extension(user): Extension<AuthUser>) -> ApiResult<WhoamiResponse> {
    Ok(ApiResponse::success(WhoamiResponse {
        id: user.user_id,
        email: user.email,
    }))
}

/// POST /api/auth/logout - end the remote session and drop the cookie
///
/// The cookie is cleared even when the auth service call fails.
pub async fn session_logout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Response {
    let clear = [(header::SET_COOKIE, clear_session_cookie_header(&state.config.security))];

    match state.auth.sign_out(&user.access_token).await {
        Ok(()) => {
            tracing::info!("Admin session ended for user {}", user.user_id);
            (clear, ApiResponse::success(json!({ "signed_out": true }))).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to end session for user {}: {}", user.user_id, e);
            (clear, ApiError::bad_gateway("Could not sign out, please try again")).into_response()
        }
    }
}
