//! Clients for the hosted platform: table API, object storage and password auth.
//!
//! Each remote capability sits behind a trait so the services can be driven
//! by in-memory fakes in tests. [`SupabaseClient`] implements all three over
//! the platform's REST conventions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AccessToken, ImageUpload, NewProduct, Product, ProductId, ProductPatch};

pub mod auth;
pub mod client;
pub mod products;
pub mod storage;

pub use client::SupabaseClient;

/// Errors from the remote platform
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} responded with {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Authenticated user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session issued by a successful password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
    pub user: SessionUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Row-level access to the `products` table
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All rows, newest first
    async fn list(&self) -> Result<Vec<Product>, PlatformError>;

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, PlatformError>;

    async fn insert(&self, token: &AccessToken, product: &NewProduct) -> Result<Product, PlatformError>;

    async fn update(
        &self,
        token: &AccessToken,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, PlatformError>;

    async fn delete(&self, token: &AccessToken, id: &ProductId) -> Result<(), PlatformError>;

    /// Reachability check used by /health
    async fn ping(&self) -> Result<(), PlatformError>;
}

/// Named-bucket object storage
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image under `object_name` and return its public URL
    async fn upload(
        &self,
        token: &AccessToken,
        object_name: &str,
        image: &ImageUpload,
    ) -> Result<String, PlatformError>;
}

/// Password-based session creation and termination
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, PlatformError>;

    async fn sign_out(&self, token: &AccessToken) -> Result<(), PlatformError>;
}
