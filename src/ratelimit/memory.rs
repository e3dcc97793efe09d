use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, WindowState, WindowStore};

/// Process-local sliding windows.
///
/// Only meaningful for a single server instance; attempts are lost on restart.
/// Keys whose attempts have all expired are swept at most once per window.
#[derive(Default)]
pub struct MemoryWindowStore {
    inner: Mutex<Windows>,
}

#[derive(Default)]
struct Windows {
    attempts: HashMap<String, VecDeque<i64>>,
    last_sweep_ms: Option<i64>,
}

impl Windows {
    fn sweep(&mut self, window_ms: i64, now_ms: i64) {
        let due = self
            .last_sweep_ms
            .map_or(true, |last| now_ms - last >= window_ms);
        if !due {
            return;
        }

        let cutoff = now_ms - window_ms;
        self.attempts
            .retain(|_, attempts| attempts.back().is_some_and(|&at| at > cutoff));
        self.last_sweep_ms = Some(now_ms);
    }
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.inner.lock().await.attempts.len()
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn record(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64) -> Result<WindowState, StoreError> {
        let mut windows = self.inner.lock().await;
        windows.sweep(window_ms, now_ms);

        let attempts = windows.attempts.entry(key.to_string()).or_default();
        while attempts.front().is_some_and(|&at| at <= now_ms - window_ms) {
            attempts.pop_front();
        }

        if attempts.len() >= limit as usize {
            let oldest = attempts.front().copied().unwrap_or(now_ms);
            return Ok(WindowState {
                allowed: false,
                remaining: 0,
                reset_at_ms: oldest + window_ms,
            });
        }

        attempts.push_back(now_ms);
        let oldest = attempts.front().copied().unwrap_or(now_ms);
        Ok(WindowState {
            allowed: true,
            remaining: limit - attempts.len() as u32,
            reset_at_ms: oldest + window_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejected_attempts_are_not_recorded() {
        let store = MemoryWindowStore::new();
        assert!(store.record("k", 2, 1_000, 0).await.unwrap().allowed);
        assert!(store.record("k", 2, 1_000, 1).await.unwrap().allowed);

        let rejected = store.record("k", 2, 1_000, 2).await.unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.reset_at_ms, 1_000);

        // t=2 was never recorded, so at t=1000 the window holds only t=1
        let state = store.record("k", 2, 1_000, 1_000).await.unwrap();
        assert!(state.allowed);
        assert_eq!(state.remaining, 0);
        assert_eq!(state.reset_at_ms, 1_001);
    }

    #[tokio::test]
    async fn expired_keys_are_evicted() {
        let store = MemoryWindowStore::new();
        for i in 0..10_000 {
            store.record(&format!("client-{}", i), 5, 1_000, 0).await.unwrap();
        }
        assert_eq!(store.tracked_keys().await, 10_000);

        store.record("late-client", 5, 1_000, 1_000_000).await.unwrap();
        assert_eq!(store.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn live_windows_survive_a_sweep() {
        let store = MemoryWindowStore::new();
        store.record("old", 5, 1_000, 0).await.unwrap();
        store.record("recent", 5, 1_000, 900).await.unwrap();

        // sweep at t=1000 drops "old" (last attempt at the cutoff) but keeps "recent"
        store.record("new", 5, 1_000, 1_000).await.unwrap();
        assert_eq!(store.tracked_keys().await, 2);

        let state = store.record("recent", 5, 1_000, 1_001).await.unwrap();
        assert_eq!(state.remaining, 3);
    }
}
