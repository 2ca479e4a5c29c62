use async_trait::async_trait;
use hoot_storage::AiConfig;

use crate::error::ClassifierError;
use crate::providers::GeminiProvider;

/// Trait for AI providers
#[async_trait]
pub trait AiProviderTrait: Send + Sync {
    /// Generate text for a prompt, optionally capping the output length
    async fn generate(
        &self,
        prompt: &str,
        max_output_tokens: Option<u32>,
    ) -> Result<String, ClassifierError>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns `Disabled` when AI is switched off and `MissingApiKey` when no key
/// is stored or present in the environment.
pub fn create_provider(config: &AiConfig) -> Result<Box<dyn AiProviderTrait>, ClassifierError> {
    if !config.enabled {
        return Err(ClassifierError::Disabled);
    }
    let api_key = config
        .effective_api_key()
        .ok_or(ClassifierError::MissingApiKey)?;

    Ok(Box::new(GeminiProvider::new(
        &api_key,
        config.effective_model(),
        config.effective_base_url(),
        config.max_output_tokens,
        config.temperature,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_requires_key() {
        let config = AiConfig {
            api_key: Some("   ".to_string()),
            ..AiConfig::default()
        };
        if std::env::var("GEMINI_API_KEY").is_err() {
            assert!(matches!(
                create_provider(&config),
                Err(ClassifierError::MissingApiKey)
            ));
        }
    }

    #[test]
    fn test_create_provider_disabled() {
        let config = AiConfig {
            api_key: Some("key".to_string()),
            enabled: false,
            ..AiConfig::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(ClassifierError::Disabled)
        ));
    }

    #[test]
    fn test_create_provider_uses_configured_model() {
        let config = AiConfig {
            api_key: Some("key".to_string()),
            model: Some("gemini-1.5-flash".to_string()),
            ..AiConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gemini-1.5-flash");
    }
}
