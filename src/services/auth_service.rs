use std::sync::Arc;
use std::time::Duration;

use crate::platform::{AuthProvider, PlatformError, Session};
use crate::ratelimit::{Decision, RateLimiter};
use crate::types::AccessToken;
use crate::validation::credentials_are_well_formed;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Too many attempts")]
    RateLimited { retry_after: Duration },

    /// Deliberately the same for malformed input, unknown accounts and wrong passwords
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login is temporarily unavailable")]
    Unavailable,
}

/// Rate-limited password sign-in against the platform's auth service
pub struct AuthService {
    limiter: RateLimiter,
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    pub fn new(limiter: RateLimiter, provider: Arc<dyn AuthProvider>) -> Self {
        Self { limiter, provider }
    }

    /// Check the limiter for `identifier` first; credentials are only looked at
    /// when the attempt is inside the allowance.
    pub async fn authenticate(&self, identifier: &str, email: &str, password: &str) -> Result<Session, LoginError> {
        match self.limiter.check(identifier).await {
            Decision::Allowed { .. } => {}
            Decision::Limited { retry_after } => return Err(LoginError::RateLimited { retry_after }),
            Decision::Unavailable => return Err(LoginError::Unavailable),
        }

        if !credentials_are_well_formed(email, password) {
            return Err(LoginError::InvalidCredentials);
        }

        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                tracing::info!("Admin session established for user {}", session.user.id);
                Ok(session)
            }
            Err(PlatformError::InvalidCredentials) => {
                tracing::warn!("Rejected login attempt");
                Err(LoginError::InvalidCredentials)
            }
            Err(e) => {
                tracing::error!("Auth service error during login: {}", e);
                Err(LoginError::InvalidCredentials)
            }
        }
    }

    pub async fn sign_out(&self, token: &AccessToken) -> Result<(), PlatformError> {
        self.provider.sign_out(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailMode;
    use crate::ratelimit::{LimiterOptions, MemoryWindowStore, WindowStore};
    use crate::testing::{StaticAuthProvider, UnreachableWindowStore};

    const EMAIL: &str = "admin@sogrub.es";
    const PASSWORD: &str = "restaurar";

    fn service_with(store: Arc<dyn WindowStore>, fail_mode: FailMode) -> (AuthService, Arc<StaticAuthProvider>) {
        let provider = Arc::new(StaticAuthProvider::new(EMAIL, PASSWORD, "jwt-secret"));
        let limiter = RateLimiter::new(
            store,
            LimiterOptions {
                limit: 5,
                window: Duration::from_secs(300),
                fail_mode,
                key_prefix: "login".to_string(),
            },
        );
        (AuthService::new(limiter, provider.clone()), provider)
    }

    fn service() -> (AuthService, Arc<StaticAuthProvider>) {
        service_with(Arc::new(MemoryWindowStore::new()), FailMode::Closed)
    }

    #[tokio::test]
    async fn valid_credentials_open_a_session() {
        let (service, _) = service();
        let session = service.authenticate("client", EMAIL, PASSWORD).await.unwrap();
        assert_eq!(session.user.email.as_deref(), Some(EMAIL));
        assert!(!session.access_token.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_account_look_the_same() {
        let (service, _) = service();
        let wrong = service.authenticate("client", EMAIL, "nope").await.unwrap_err();
        let unknown = service.authenticate("client", "who@sogrub.es", PASSWORD).await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn malformed_credentials_skip_the_auth_service() {
        let (service, provider) = service();
        let err = service.authenticate("client", "not-an-email", PASSWORD).await.unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));

        let err = service.authenticate("client", EMAIL, "").await.unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
        assert_eq!(provider.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn sixth_attempt_is_limited_even_with_correct_password() {
        let (service, provider) = service();
        for _ in 0..4 {
            let _ = service.authenticate("client", EMAIL, "wrong").await;
        }
        // the fifth attempt still reaches credential validation
        assert!(service.authenticate("client", EMAIL, PASSWORD).await.is_ok());
        assert_eq!(provider.sign_in_calls(), 5);

        let err = service.authenticate("client", EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(err, LoginError::RateLimited { retry_after } if retry_after <= Duration::from_secs(300)));
        assert_eq!(provider.sign_in_calls(), 5);
    }

    #[tokio::test]
    async fn closed_limiter_outage_skips_the_auth_service() {
        let store = Arc::new(UnreachableWindowStore::new());
        let (service, provider) = service_with(store.clone(), FailMode::Closed);

        let err = service.authenticate("client", EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(err, LoginError::Unavailable));
        assert_eq!(store.calls(), 1);
        assert_eq!(provider.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn open_limiter_outage_still_checks_credentials() {
        let store = Arc::new(UnreachableWindowStore::new());
        let (service, provider) = service_with(store.clone(), FailMode::Open);

        assert!(service.authenticate("client", EMAIL, PASSWORD).await.is_ok());
        let err = service.authenticate("client", EMAIL, "wrong").await.unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
        assert_eq!(store.calls(), 2);
        assert_eq!(provider.sign_in_calls(), 2);
    }
}
