//! In-memory stand-ins for the hosted platform, used by unit and integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::platform::{AuthProvider, ImageStore, PlatformError, ProductStore, Session, SessionUser};
use crate::ratelimit::{MemoryWindowStore, StoreError, WindowState, WindowStore};
use crate::state::AppState;
use crate::types::{AccessToken, ImageUpload, NewProduct, Product, ProductId, ProductPatch};

pub const ADMIN_EMAIL: &str = "admin@sogrub.es";
pub const ADMIN_PASSWORD: &str = "restaurar-2024";
pub const JWT_SECRET: &str = "test-jwt-secret";

fn unavailable() -> PlatformError {
    PlatformError::Unavailable("simulated outage".to_string())
}

/// `products` table held in memory
#[derive(Default)]
pub struct MemoryProductStore {
    rows: Mutex<Vec<Product>>,
    last_created: Mutex<Option<DateTime<Utc>>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Insert, update and delete calls received, successful or not
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), PlatformError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }

    /// Strictly increasing creation timestamps keep listing order deterministic
    fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self.last_created.lock().unwrap();
        let now = Utc::now();
        let created_at = match *last {
            Some(prev) if prev >= now => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(created_at);
        created_at
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, PlatformError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, PlatformError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|p| &p.id == id).cloned())
    }

    async fn insert(&self, _token: &AccessToken, product: &NewProduct) -> Result<Product, PlatformError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let row = Product {
            id: ProductId::new(Uuid::new_v4().to_string()),
            title: product.title.clone(),
            description: product.description.clone(),
            materials: product.materials.clone(),
            price: product.price,
            width: product.width,
            height: product.height,
            depth: product.depth,
            image_url: product.image_url.clone(),
            created_at: self.next_created_at(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        _token: &AccessToken,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, PlatformError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| PlatformError::NotFound(format!("product {}", id)))?;
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn delete(&self, _token: &AccessToken, id: &ProductId) -> Result<(), PlatformError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| &p.id != id);
        if rows.len() == before {
            return Err(PlatformError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        self.check()
    }
}

/// Bucket that keeps object names and hands out URLs under `base_url`
pub struct MemoryImageStore {
    base_url: String,
    objects: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryImageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(
        &self,
        _token: &AccessToken,
        object_name: &str,
        _image: &ImageUpload,
    ) -> Result<String, PlatformError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.objects.lock().unwrap().push(object_name.to_string());
        Ok(format!("{}/{}", self.base_url, object_name))
    }
}

/// Auth service with a single account that issues real HS256 tokens
pub struct StaticAuthProvider {
    accounts: HashMap<String, (String, String)>,
    secret: String,
    sign_ins: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl StaticAuthProvider {
    pub fn new(email: &str, password: &str, secret: &str) -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(email.to_string(), (password.to_string(), Uuid::new_v4().to_string()));
        Self {
            accounts,
            secret: secret.to_string(),
            sign_ins: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_ins.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    /// Token for the account without going through sign-in
    pub fn token_for(&self, email: &str) -> Option<String> {
        let (_, user_id) = self.accounts.get(email)?;
        let claims = Claims::new(user_id.clone(), Some(email.to_string()), Duration::hours(1));
        generate_jwt(&claims, &self.secret).ok()
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, PlatformError> {
        self.sign_ins.fetch_add(1, Ordering::SeqCst);

        let (expected, user_id) = self.accounts.get(email).ok_or(PlatformError::InvalidCredentials)?;
        if expected != password {
            return Err(PlatformError::InvalidCredentials);
        }

        let access_token = self.token_for(email).ok_or(PlatformError::InvalidCredentials)?;
        Ok(Session {
            access_token,
            refresh_token: Uuid::new_v4().simple().to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            user: SessionUser {
                id: user_id.clone(),
                email: Some(email.to_string()),
            },
        })
    }

    async fn sign_out(&self, _token: &AccessToken) -> Result<(), PlatformError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Limiter store whose every request fails, as when the key-value service is down
#[derive(Default)]
pub struct UnreachableWindowStore {
    calls: AtomicUsize,
}

impl UnreachableWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WindowStore for UnreachableWindowStore {
    async fn record(&self, _key: &str, _limit: u32, _window_ms: i64, _now_ms: i64) -> Result<WindowState, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

/// Configuration pointing at placeholder hosts, with the in-memory limiter
pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = [
        ("SUPABASE_URL", "https://platform.test"),
        ("SUPABASE_ANON_KEY", "anon-key"),
        ("SUPABASE_JWT_SECRET", JWT_SECRET),
        ("SITE_URL", "https://sogrub.test"),
        ("RATE_LIMIT_BACKEND", "memory"),
    ]
    .into_iter()
    .collect();

    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test configuration is complete")
}

/// Application state wired to in-memory collaborators, with handles to inspect them
pub struct TestApp {
    pub state: AppState,
    pub products: Arc<MemoryProductStore>,
    pub images: Arc<MemoryImageStore>,
    pub auth: Arc<StaticAuthProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::with_window_store(config, Arc::new(MemoryWindowStore::new()))
    }

    pub fn with_window_store(config: AppConfig, window_store: Arc<dyn WindowStore>) -> Self {
        let products = Arc::new(MemoryProductStore::new());
        let images = Arc::new(MemoryImageStore::new(format!(
            "{}/storage/v1/object/public/{}",
            config.platform.url, config.platform.image_bucket
        )));
        let auth = Arc::new(StaticAuthProvider::new(
            ADMIN_EMAIL,
            ADMIN_PASSWORD,
            &config.platform.jwt_secret,
        ));

        let state = AppState::new(
            config,
            products.clone(),
            images.clone(),
            auth.clone(),
            window_store,
        );

        Self {
            state,
            products,
            images,
            auth,
        }
    }

    pub fn admin_token(&self) -> String {
        self.auth.token_for(ADMIN_EMAIL).expect("admin account exists")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
