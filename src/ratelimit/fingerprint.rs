use axum::http::HeaderMap;

const UNKNOWN: &str = "unknown";
const USER_AGENT_CHARS: usize = 50;

/// Derive the rate-limit identifier for a request: `<client ip>:<user agent prefix>`.
///
/// Built from client-controlled headers, so it groups honest clients but does
/// not stop one that rotates its own headers.
pub fn fingerprint(headers: &HeaderMap) -> String {
    let ip = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(UNKNOWN);

    let user_agent: String = header_str(headers, "user-agent")
        .map(|ua| ua.chars().take(USER_AGENT_CHARS).collect())
        .unwrap_or_else(|| UNKNOWN.to_string());

    format!("{}:{}", ip, user_agent)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
