//! Locate a JSON object inside free-form model output.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::ClassifierError;

fn fenced_block() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap_or_else(|e| {
            unreachable!("fenced block pattern is valid: {e}")
        })
    })
}

/// Parse `text` as JSON, falling back to a fenced code block and then to the
/// outermost `{...}` span.
///
/// # Errors
///
/// Returns `MalformedResponse` if no candidate parses as a JSON object.
pub fn extract_json(text: &str) -> Result<Value, ClassifierError> {
    let trimmed = text.trim();

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(inner) = fenced_block().captures(trimmed).and_then(|c| c.get(1)) {
        candidates.push(inner.as_str());
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find(Value::is_object)
        .ok_or_else(|| {
            log::warn!("Failed to parse JSON from model output: {trimmed}");
            ClassifierError::MalformedResponse("model did not return a JSON object".to_string())
        })
}
