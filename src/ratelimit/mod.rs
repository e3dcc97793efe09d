//! Sliding-window limiter for login attempts.
//!
//! Attempts are grouped by a client fingerprint and recorded in a
//! [`WindowStore`]. The store owns the check-and-record step so that it stays
//! atomic across server instances; the limiter only parameterizes it, hashes
//! the key and applies the configured fail mode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{FailMode, RateLimitSettings};

pub mod fingerprint;
pub mod memory;
pub mod upstash;

pub use fingerprint::fingerprint;
pub use memory::MemoryWindowStore;
pub use upstash::UpstashWindowStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key-value store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("key-value store error: {0}")]
    Backend(String),

    #[error("unexpected key-value store response: {0}")]
    Protocol(String),
}

/// Outcome of one check-and-record step in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub allowed: bool,
    pub remaining: u32,
    /// Unix millis at which the oldest attempt in the window expires
    pub reset_at_ms: i64,
}

/// Backing store for sliding windows.
///
/// `record` must atomically drop attempts older than `window_ms`, reject when
/// `limit` attempts remain, and otherwise record the attempt at `now_ms`.
#[async_trait]
pub trait WindowStore: Send + Sync {
    async fn record(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64) -> Result<WindowState, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
    /// Store unreachable and the limiter is configured to fail closed
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct LimiterOptions {
    pub limit: u32,
    pub window: Duration,
    pub fail_mode: FailMode,
    pub key_prefix: String,
}

impl From<&RateLimitSettings> for LimiterOptions {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            limit: settings.attempts,
            window: Duration::from_secs(settings.window_secs),
            fail_mode: settings.fail_mode,
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn WindowStore>,
    options: LimiterOptions,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn WindowStore>, options: LimiterOptions) -> Self {
        Self { store, options }
    }

    pub async fn check(&self, identifier: &str) -> Decision {
        self.check_at(identifier, Utc::now()).await
    }

    pub async fn check_at(&self, identifier: &str, now: DateTime<Utc>) -> Decision {
        let key = self.key_for(identifier);
        let now_ms = now.timestamp_millis();
        let window_ms = i64::try_from(self.options.window.as_millis()).unwrap_or(i64::MAX);

        match self.store.record(&key, self.options.limit, window_ms, now_ms).await {
            Ok(state) if state.allowed => Decision::Allowed {
                remaining: state.remaining,
            },
            Ok(state) => {
                let wait_ms = (state.reset_at_ms - now_ms).max(0) as u64;
                tracing::warn!("Rate limit exceeded for {}, resets in {}ms", key, wait_ms);
                Decision::Limited {
                    retry_after: Duration::from_millis(wait_ms),
                }
            }
            Err(e) => match self.options.fail_mode {
                FailMode::Open => {
                    tracing::warn!("Rate limit store unavailable, failing open: {}", e);
                    Decision::Allowed {
                        remaining: self.options.limit,
                    }
                }
                FailMode::Closed => {
                    tracing::error!("Rate limit store unavailable, failing closed: {}", e);
                    Decision::Unavailable
                }
            },
        }
    }

    fn key_for(&self, identifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        format!("{}:{:x}", self.options.key_prefix, hasher.finalize())
    }
}

/// Human-readable wait, floored to whole seconds
pub fn format_wait(wait: Duration) -> String {
    let secs = wait.as_secs();
    let (minutes, seconds) = (secs / 60, secs % 60);
    if minutes > 0 {
        format!("{} minutes and {} seconds", minutes, seconds)
    } else {
        format!("{} seconds", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limiter(store: Arc<dyn WindowStore>, fail_mode: FailMode) -> RateLimiter {
        RateLimiter::new(
            store,
            LimiterOptions {
                limit: 5,
                window: Duration::from_secs(300),
                fail_mode,
                key_prefix: "test".to_string(),
            },
        )
    }

    struct BrokenStore;

    #[async_trait]
    impl WindowStore for BrokenStore {
        async fn record(&self, _: &str, _: u32, _: i64, _: i64) -> Result<WindowState, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn sixth_attempt_in_window_is_limited() {
        let limiter = limiter(Arc::new(MemoryWindowStore::new()), FailMode::Closed);

        for attempt in 0..5 {
            let decision = limiter.check_at("1.2.3.4:curl", at(attempt)).await;
            assert_eq!(
                decision,
                Decision::Allowed {
                    remaining: 4 - attempt as u32
                }
            );
        }

        match limiter.check_at("1.2.3.4:curl", at(10)).await {
            Decision::Limited { retry_after } => {
                // oldest attempt at t=0 expires at t=300
                assert_eq!(retry_after, Duration::from_secs(290));
            }
            other => panic!("expected limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn window_elapsing_resets_the_counter() {
        let limiter = limiter(Arc::new(MemoryWindowStore::new()), FailMode::Closed);
        for attempt in 0..6 {
            limiter.check_at("client", at(attempt)).await;
        }

        let decision = limiter.check_at("client", at(306)).await;
        assert_eq!(decision, Decision::Allowed { remaining: 4 });
    }

    #[tokio::test]
    async fn fingerprints_are_limited_independently() {
        let limiter = limiter(Arc::new(MemoryWindowStore::new()), FailMode::Closed);
        for attempt in 0..5 {
            limiter.check_at("a", at(attempt)).await;
        }

        assert!(matches!(limiter.check_at("a", at(6)).await, Decision::Limited { .. }));
        assert!(matches!(limiter.check_at("b", at(6)).await, Decision::Allowed { .. }));
    }

    #[tokio::test]
    async fn store_failure_respects_fail_mode() {
        let closed = limiter(Arc::new(BrokenStore), FailMode::Closed);
        assert_eq!(closed.check("x").await, Decision::Unavailable);

        let open = limiter(Arc::new(BrokenStore), FailMode::Open);
        assert_eq!(open.check("x").await, Decision::Allowed { remaining: 5 });
    }

    #[test]
    fn keys_hide_the_raw_fingerprint() {
        let limiter = limiter(Arc::new(MemoryWindowStore::new()), FailMode::Closed);
        let key = limiter.key_for("10.0.0.1:Mozilla/5.0");
        assert!(key.starts_with("test:"));
        assert!(!key.contains("10.0.0.1"));
        assert_eq!(key.len(), "test:".len() + 64);
    }

    #[test]
    fn formats_wait_durations() {
        assert_eq!(format_wait(Duration::from_millis(252_900)), "4 minutes and 12 seconds");
        assert_eq!(format_wait(Duration::from_secs(60)), "1 minutes and 0 seconds");
        assert_eq!(format_wait(Duration::from_millis(9_999)), "9 seconds");
        assert_eq!(format_wait(Duration::ZERO), "0 seconds");
    }
}
