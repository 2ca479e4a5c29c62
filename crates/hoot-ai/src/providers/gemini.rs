use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::ai_provider::AiProviderTrait;
use crate::error::ClassifierError;
use crate::http::ResponseExt;

/// Keys must not appear in the request URL
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google GenAI (Gemini) Provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_output_tokens: u32,
    temperature: f32,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_output_tokens,
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl AiProviderTrait for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        max_output_tokens: Option<u32>,
    ) -> Result<String, ClassifierError> {
        let body = json!({
            "contents": [{
                "parts": [{
                    "text": prompt
                }]
            }],
            "generationConfig": {
                "maxOutputTokens": max_output_tokens.unwrap_or(self.max_output_tokens),
                "temperature": self.temperature,
            }
        });

        log::debug!("Sending {} byte prompt to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?
            .ensure_success("Gemini")
            .await?;

        let json: serde_json::Value = response.json().await.map_err(|e| {
            ClassifierError::MalformedResponse(format!(
                "Failed to parse Gemini response: {}",
                e.without_url()
            ))
        })?;

        // Extract text from: candidates[0].content.parts[0].text
        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ClassifierError::MalformedResponse("No text generated from Gemini".to_string())
            })
    }
}
