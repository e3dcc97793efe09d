use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub platform: PlatformConfig,
    pub rate_limit: RateLimitSettings,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosted database, storage and auth platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub anon_key: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub image_bucket: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Upstash-compatible Redis REST endpoint
    Upstash,
    /// Process-local map, for development and tests
    Memory,
}

/// What the login limiter does when its store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailMode {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvConfig {
    pub rest_url: String,
    #[serde(skip_serializing)]
    pub rest_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub backend: RateLimitBackend,
    pub kv: Option<KvConfig>,
    pub attempts: u32,
    pub window_secs: u64,
    pub fail_mode: FailMode,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub max_image_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    pub session_cookie: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let platform = PlatformConfig {
            url: parse_url("SUPABASE_URL", required("SUPABASE_URL")?)?,
            anon_key: required("SUPABASE_ANON_KEY")?,
            jwt_secret: required("SUPABASE_JWT_SECRET")?,
            image_bucket: "product-images".to_string(),
            request_timeout_secs: 10,
        };
        let site = SiteConfig {
            url: parse_url("SITE_URL", required("SITE_URL")?)?,
        };

        // Set defaults based on environment, then override with specific env vars
        let mut config = match environment {
            Environment::Production => Self::production(platform, site),
            Environment::Staging => Self::staging(platform, site),
            Environment::Development => Self::development(platform, site),
        };
        config.apply_overrides(&lookup)?;

        if config.rate_limit.backend == RateLimitBackend::Upstash {
            config.rate_limit.kv = Some(KvConfig {
                rest_url: parse_url("UPSTASH_REDIS_REST_URL", required("UPSTASH_REDIS_REST_URL")?)?,
                rest_token: required("UPSTASH_REDIS_REST_TOKEN")?,
            });
        }

        if config.platform.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "PLATFORM_TIMEOUT_SECS",
                message: "must be at least 1".to_string(),
            });
        }
        if config.rate_limit.attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_ATTEMPTS",
                message: "must be at least 1".to_string(),
            });
        }
        if config.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_SECS",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Platform overrides
        if let Some(v) = lookup("SUPABASE_IMAGE_BUCKET") {
            self.platform.image_bucket = v.trim().to_string();
        }
        if let Some(v) = lookup("PLATFORM_TIMEOUT_SECS") {
            self.platform.request_timeout_secs = parse_number("PLATFORM_TIMEOUT_SECS", &v)?;
        }

        // Rate limit overrides
        if let Some(v) = lookup("RATE_LIMIT_BACKEND") {
            self.rate_limit.backend = match v.trim().to_ascii_lowercase().as_str() {
                "upstash" | "redis" => RateLimitBackend::Upstash,
                "memory" => RateLimitBackend::Memory,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "RATE_LIMIT_BACKEND",
                        message: format!("unknown backend '{}'", other),
                    })
                }
            };
        }
        if let Some(v) = lookup("RATE_LIMIT_FAIL_MODE") {
            self.rate_limit.fail_mode = match v.trim().to_ascii_lowercase().as_str() {
                "open" => FailMode::Open,
                "closed" => FailMode::Closed,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "RATE_LIMIT_FAIL_MODE",
                        message: format!("expected 'open' or 'closed', got '{}'", other),
                    })
                }
            };
        }
        if let Some(v) = lookup("RATE_LIMIT_ATTEMPTS") {
            self.rate_limit.attempts = parse_number("RATE_LIMIT_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse_number("RATE_LIMIT_WINDOW_SECS", &v)?;
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse_number("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }
        if let Some(v) = lookup("API_MAX_IMAGE_BYTES") {
            self.api.max_image_bytes = parse_number("API_MAX_IMAGE_BYTES", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }

        Ok(())
    }

    fn development(platform: PlatformConfig, site: SiteConfig) -> Self {
        Self {
            environment: Environment::Development,
            platform,
            rate_limit: RateLimitSettings::default(),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                max_image_bytes: 5 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string()],
                require_https: false,
                session_cookie: "sogrub-session".to_string(),
            },
            site,
        }
    }

    fn staging(platform: PlatformConfig, site: SiteConfig) -> Self {
        Self {
            environment: Environment::Staging,
            platform,
            rate_limit: RateLimitSettings::default(),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 8 * 1024 * 1024,
                max_image_bytes: 5 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![site.url.clone()],
                require_https: true,
                session_cookie: "sogrub-session".to_string(),
            },
            site,
        }
    }

    fn production(platform: PlatformConfig, site: SiteConfig) -> Self {
        Self {
            environment: Environment::Production,
            platform,
            rate_limit: RateLimitSettings::default(),
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 6 * 1024 * 1024,
                max_image_bytes: 5 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![site.url.clone()],
                require_https: true,
                session_cookie: "sogrub-session".to_string(),
            },
            site,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            backend: RateLimitBackend::Upstash,
            kv: None,
            attempts: 5,
            window_secs: 5 * 60,
            fail_mode: FailMode::Closed,
            key_prefix: "ratelimit:login".to_string(),
        }
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: format!("'{}' is not a valid number: {}", raw.trim(), e),
    })
}

fn parse_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    let url = url::Url::parse(&value).map_err(|e| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key,
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
