use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::AccessToken;

/// Authenticated user context extracted from the platform access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: AccessToken,
}

impl AuthUser {
    fn from_claims(claims: Claims, token: String) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            access_token: AccessToken::new(token),
        }
    }
}

/// Session middleware for admin routes: accepts `Authorization: Bearer` or the
/// session cookie, verifies the token locally and injects [`AuthUser`]
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers, &state.config.security.session_cookie).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.config.platform.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::unauthorized("Invalid or expired session")
    })?;

    request.extensions_mut().insert(AuthUser::from_claims(claims, token));

    Ok(next.run(request).await)
}

/// Bearer header first, then the session cookie
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header format".to_string())?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Some(_) => Err("Empty access token".to_string()),
            None => Err("Authorization header must use Bearer token format".to_string()),
        };
    }

    session_cookie(headers, cookie_name).ok_or_else(|| "Missing session".to_string())
}

fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying the access token for browser sessions
pub fn session_cookie_header(security: &SecurityConfig, token: &str, max_age_secs: u64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        security.session_cookie, token, max_age_secs
    );
    if security.require_https {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_session_cookie_header(security: &SecurityConfig) -> String {
    session_cookie_header(security, "", 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn security(require_https: bool) -> SecurityConfig {
        SecurityConfig {
            cors_origins: Vec::new(),
            require_https,
            session_cookie: "sogrub-session".to_string(),
        }
    }

    #[test]
    fn session_cookie_is_http_only_and_secure_when_required() {
        let cookie = session_cookie_header(&security(true), "tok", 3600);
        assert_eq!(
            cookie,
            "sogrub-session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure"
        );

        let cleared = clear_session_cookie_header(&security(false));
        assert_eq!(cleared, "sogrub-session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    }

    #[test]
    fn prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("sogrub-session=from-cookie"));
        assert_eq!(extract_token(&headers, "sogrub-session").unwrap(), "abc");
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sogrub-session=tok.en.value; other=1"),
        );
        assert_eq!(extract_token(&headers, "sogrub-session").unwrap(), "tok.en.value");
    }

    #[test]
    fn rejects_missing_or_malformed() {
        assert!(extract_token(&HeaderMap::new(), "sogrub-session").is_err());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(extract_token(&headers, "sogrub-session").is_err());

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sogrub-session="));
        assert!(extract_token(&headers, "sogrub-session").is_err());
    }
}
