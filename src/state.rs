use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::{AppConfig, RateLimitBackend};
use crate::platform::{AuthProvider, ImageStore, ProductStore, SupabaseClient};
use crate::ratelimit::{LimiterOptions, MemoryWindowStore, RateLimiter, UpstashWindowStore, WindowStore};
use crate::services::{AuthService, CatalogService};
use crate::site::SiteInfo;

/// Shared handles passed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogService>,
    pub auth: Arc<AuthService>,
    pub site: Arc<SiteInfo>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        products: Arc<dyn ProductStore>,
        images: Arc<dyn ImageStore>,
        auth_provider: Arc<dyn AuthProvider>,
        window_store: Arc<dyn WindowStore>,
    ) -> Self {
        let catalog = CatalogService::new(products, images, config.api.max_image_bytes);
        let limiter = RateLimiter::new(window_store, LimiterOptions::from(&config.rate_limit));
        let auth = AuthService::new(limiter, auth_provider);
        let site = SiteInfo::new(&config.site.url);

        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            auth: Arc::new(auth),
            site: Arc::new(site),
        }
    }

    /// Wire the real platform and key-value clients from configuration
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let supabase = Arc::new(SupabaseClient::new(&config.platform).context("failed to build platform client")?);

        let window_store: Arc<dyn WindowStore> = match config.rate_limit.backend {
            RateLimitBackend::Upstash => {
                let kv = config
                    .rate_limit
                    .kv
                    .as_ref()
                    .context("Upstash rate limit backend selected without credentials")?;
                let timeout = Duration::from_secs(config.platform.request_timeout_secs);
                Arc::new(UpstashWindowStore::new(kv, timeout).context("failed to build key-value client")?)
            }
            RateLimitBackend::Memory => {
                tracing::warn!("Using in-memory login rate limiter; attempts are not shared between instances");
                Arc::new(MemoryWindowStore::new())
            }
        };

        Ok(Self::new(
            config,
            supabase.clone(),
            supabase.clone(),
            supabase,
            window_store,
        ))
    }
}
