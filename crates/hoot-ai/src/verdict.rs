use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_REASON: &str = "No reason provided";
pub const FAIL_OPEN_REASON: &str = "AI analysis unavailable - allowing by default";

/// Already-extracted metadata for one piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Stable content id (the video id on the video host)
    pub content_id: String,
    pub title: String,
    pub channel: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Block,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// Allow/block decision plus a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub decision: Decision,
    pub reason: String,
}

impl ClassificationVerdict {
    #[must_use]
    pub fn allow(reason: &str) -> Self {
        Self {
            decision: Decision::Allow,
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn block(reason: &str) -> Self {
        Self {
            decision: Decision::Block,
            reason: reason.to_string(),
        }
    }

    /// Verdict used whenever the classifier cannot give a usable answer
    #[must_use]
    pub fn fail_open() -> Self {
        Self::allow(FAIL_OPEN_REASON)
    }

    #[must_use]
    pub fn allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    /// Map a parsed classifier reply to a verdict.
    ///
    /// Only an explicit `"block"` decision blocks; anything else allows.
    #[must_use]
    pub fn from_reply(reply: &Value) -> Self {
        let decision = match reply["decision"].as_str() {
            Some(d) if d.trim().eq_ignore_ascii_case("block") => Decision::Block,
            _ => Decision::Allow,
        };
        let reason = reply["reason"]
            .as_str()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASON)
            .to_string();

        Self { decision, reason }
    }
}
