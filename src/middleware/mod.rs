pub mod auth;
pub mod response;

pub use auth::{clear_session_cookie_header, session_auth_middleware, session_cookie_header, AuthUser};
pub use response::{ApiResponse, ApiResult};
