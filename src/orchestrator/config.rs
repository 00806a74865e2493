use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::orchestrator::constants::{
    DEFAULT_MAX_REPLY_LENGTH, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STANDBY_DEBOUNCE,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub completion_url: String,
    pub log_url: String,
    pub feed_url: String,
    pub target_email: String,
}

impl EndpointConfig {
    /// 从 `KAIWA_*` 环境变量读取端点，缺失时退回本地默认值。
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            completion_url: std::env::var("KAIWA_COMPLETION_URL")
                .unwrap_or(defaults.completion_url),
            log_url: std::env::var("KAIWA_LOG_URL").unwrap_or(defaults.log_url),
            feed_url: std::env::var("KAIWA_FEED_URL").unwrap_or(defaults.feed_url),
            target_email: std::env::var("KAIWA_LOG_EMAIL").unwrap_or(defaults.target_email),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            completion_url: "http://127.0.0.1:7860/llm/generate".to_string(),
            log_url: "http://127.0.0.1:7860/llm/log_conversation".to_string(),
            feed_url: "http://127.0.0.1:8787/api/posts".to_string(),
            target_email: "kaiwa-log@example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnSessionConfig {
    pub locale: String,
    pub preferred_voice: Option<String>,
    pub max_reply_length: u32,
    pub request_timeout: Duration,
    pub standby_debounce: Duration,
    pub buffer_capacity: usize,
}

impl Default for TurnSessionConfig {
    fn default() -> Self {
        Self {
            locale: "ja-JP".to_string(),
            preferred_voice: Some("Kyoko".to_string()),
            max_reply_length: DEFAULT_MAX_REPLY_LENGTH,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            standby_debounce: DEFAULT_STANDBY_DEBOUNCE,
            buffer_capacity: 32,
        }
    }
}
