// Sliding windows kept in an Upstash-compatible Redis, reached over its REST API.
//
// Each attempt is a single EVAL so trimming, counting and recording happen
// atomically on the server. The window is a sorted set scored by attempt time.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{StoreError, WindowState, WindowStore};
use crate::config::KvConfig;

const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

redis.call("ZREMRANGEBYSCORE", key, "-inf", now - window)
local count = redis.call("ZCARD", key)
if count >= limit then
  local oldest = redis.call("ZRANGE", key, 0, 0, "WITHSCORES")
  return {0, 0, tonumber(oldest[2]) + window}
end

redis.call("ZADD", key, now, ARGV[4])
redis.call("PEXPIRE", key, window)
local oldest = redis.call("ZRANGE", key, 0, 0, "WITHSCORES")
return {1, limit - count - 1, tonumber(oldest[2]) + window}
"#;

#[derive(Debug, Deserialize)]
struct RestReply {
    result: Option<Value>,
    error: Option<String>,
}

pub struct UpstashWindowStore {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl UpstashWindowStore {
    pub fn new(config: &KvConfig, timeout: Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: config.rest_url.clone(),
            token: config.rest_token.clone(),
        })
    }
}

#[async_trait]
impl WindowStore for UpstashWindowStore {
    async fn record(&self, key: &str, limit: u32, window_ms: i64, now_ms: i64) -> Result<WindowState, StoreError> {
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());
        let command = json!([
            "EVAL",
            SLIDING_WINDOW_SCRIPT,
            "1",
            key,
            limit.to_string(),
            window_ms.to_string(),
            now_ms.to_string(),
            member,
        ]);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        let status = response.status();
        let reply: RestReply = response.json().await?;
        if let Some(error) = reply.error {
            return Err(StoreError::Backend(error));
        }
        if !status.is_success() {
            return Err(StoreError::Backend(format!("HTTP {}", status)));
        }

        parse_window_reply(reply.result.unwrap_or(Value::Null))
    }
}

fn parse_window_reply(result: Value) -> Result<WindowState, StoreError> {
    let fields = result
        .as_array()
        .filter(|a| a.len() == 3)
        .ok_or_else(|| StoreError::Protocol(result.to_string()))?;

    let int = |i: usize| {
        fields[i]
            .as_i64()
            .ok_or_else(|| StoreError::Protocol(result.to_string()))
    };

    Ok(WindowState {
        allowed: int(0)? == 1,
        remaining: u32::try_from(int(1)?.max(0)).unwrap_or(0),
        reset_at_ms: int(2)?,
    })
}
