use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One timed focus attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub goal: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
}

impl Session {
    /// Create an active session ending `duration_seconds` after `start_time`
    #[must_use]
    pub fn new(goal: String, start_time: DateTime<Utc>, duration_seconds: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal,
            start_time,
            end_time: start_time + Duration::seconds(duration_seconds),
            active: true,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Time left until the deadline, clamped at zero
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.end_time - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }
}

/// Explanation for the most recent block, shown on the block surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastBlock {
    pub title: String,
    pub url: String,
    pub reason: String,
    pub goal: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl LastBlock {
    #[must_use]
    pub fn new(title: String, url: String, reason: String, goal: String) -> Self {
        Self {
            title,
            url,
            reason,
            goal,
            timestamp: Utc::now(),
        }
    }
}

/// Last user-visible notification emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

/// Remote classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub enabled: bool,
}

impl AiConfig {
    #[must_use]
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Stored key, falling back to `GEMINI_API_KEY` from the environment
    #[must_use]
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Key with everything but the first 8 characters masked
    #[must_use]
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|k| format!("{}***", k.chars().take(8).collect::<String>()))
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            enabled: true,
        }
    }
}
