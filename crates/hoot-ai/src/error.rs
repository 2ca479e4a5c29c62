use thiserror::Error;

/// Failures talking to the remote classifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("Gemini API key not set. Add it with `hoot config set ai.api_key <key>`")]
    MissingApiKey,

    #[error("AI classification is disabled")]
    Disabled,

    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier rejected the credentials ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.without_url().to_string())
    }
}
