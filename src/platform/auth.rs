use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::json;

use super::{AuthProvider, PlatformError, Session, SupabaseClient};
use crate::types::AccessToken;

const SERVICE: &str = "auth";

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, PlatformError> {
        let response = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        // The auth service answers 400 for both unknown accounts and bad passwords
        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(PlatformError::InvalidCredentials);
        }

        Ok(Self::check(SERVICE, response).await?.json().await?)
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), PlatformError> {
        let response = self
            .request(Method::POST, &self.auth_url("logout"), Some(token))
            .send()
            .await?;

        Self::check(SERVICE, response).await?;
        Ok(())
    }
}
