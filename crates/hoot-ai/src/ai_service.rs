use hoot_storage::AiConfig;

use crate::ai_provider::{create_provider, AiProviderTrait};
use crate::error::ClassifierError;
use crate::json::extract_json;
use crate::prompts;
use crate::verdict::{ClassificationVerdict, VideoMetadata};

/// Output cap for roast generation
pub const ROAST_MAX_TOKENS: u32 = 200;

/// Upper bound on AI-suggested block list entries
pub const MAX_SUGGESTED_DOMAINS: usize = 10;

/// Unified AI Service
///
/// Handles interaction with the configured classifier and provides the
/// focus-specific functions: video analysis, block list suggestions and roasts.
pub struct AiService {
    provider: Box<dyn AiProviderTrait>,
}

impl AiService {
    /// Create a new AI service from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if AI is disabled or no API key is configured
    pub fn new(config: &AiConfig) -> Result<Self, ClassifierError> {
        let provider = create_provider(config)?;
        Ok(Self { provider })
    }

    #[must_use]
    pub fn with_provider(provider: Box<dyn AiProviderTrait>) -> Self {
        Self { provider }
    }

    /// Get the model name in use
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Judge whether a video serves the user's goal
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no JSON object can be found in the reply.
    /// Callers that must never block on a broken classifier should map errors to
    /// [`ClassificationVerdict::fail_open`].
    pub async fn analyze_video(
        &self,
        video: &VideoMetadata,
        goal: &str,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        let prompt = prompts::video_analysis_prompt(video, goal);
        let response = self.provider.generate(&prompt, None).await?;
        let reply = extract_json(&response)?;
        let verdict = ClassificationVerdict::from_reply(&reply);

        log::info!(
            "Verdict for '{}' ({}): {} - {}",
            video.title,
            video.content_id,
            verdict.decision,
            verdict.reason
        );
        Ok(verdict)
    }

    /// Ask the model for extra domains likely to distract from `goal`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply has no `domains` array
    pub async fn suggest_distracting_domains(
        &self,
        goal: &str,
    ) -> Result<Vec<String>, ClassifierError> {
        let prompt = prompts::block_list_prompt(goal);
        let response = self.provider.generate(&prompt, None).await?;
        let reply = extract_json(&response)?;

        let domains = reply["domains"].as_array().ok_or_else(|| {
            ClassifierError::MalformedResponse("reply has no domains array".to_string())
        })?;

        Ok(domains
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.contains(char::is_whitespace))
            .take(MAX_SUGGESTED_DOMAINS)
            .map(str::to_string)
            .collect())
    }

    /// Generate a short roast for a blocked video
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the model returns nothing
    pub async fn generate_roast(
        &self,
        goal: &str,
        title: &str,
        channel: Option<&str>,
        time_of_day: &str,
    ) -> Result<String, ClassifierError> {
        let prompt = prompts::roast_prompt(goal, title, channel, time_of_day);
        let roast = self
            .provider
            .generate(&prompt, Some(ROAST_MAX_TOKENS))
            .await?;
        let roast = roast.trim().trim_matches('"').trim().to_string();
        if roast.is_empty() {
            return Err(ClassifierError::MalformedResponse(
                "empty roast received".to_string(),
            ));
        }
        Ok(roast)
    }

    /// Send a trivial prompt to verify the key and endpoint
    ///
    /// # Errors
    ///
    /// Returns the underlying classifier error if the request fails
    pub async fn test_connection(&self) -> Result<(), ClassifierError> {
        self.provider.generate("Hello", Some(16)).await.map(|_| ())
    }
}
