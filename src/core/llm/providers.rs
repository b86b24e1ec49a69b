use serde_json::json;

use crate::config::LlmConfig;
use crate::error::{FlowsightError, Result};
use super::gateway::AiGateway;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Google generative-language API provider
pub struct GeminiProvider {
    config: LlmConfig,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| FlowsightError::Config("Gemini API key not set".to_string()))?;

        Ok(Self {
            config: config.clone(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl AiGateway for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.config.model, self.api_key
        );

        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens.unwrap_or(2000),
                "temperature": self.config.temperature.unwrap_or(0.3)
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FlowsightError::Gateway(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FlowsightError::Gateway(format!(
                "Gemini API error {status}: {error_text}"
            )));
        }

        let response_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FlowsightError::Parse(format!("Failed to parse Gemini response: {e}")))?;

        response_data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                FlowsightError::Gateway("Gemini response contained no completion text".to_string())
            })
    }

    fn provider_name(&self) -> &str {
        "Google Gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<bool> {
        // A models listing is the cheapest authenticated call available.
        let url = format!("{}/models?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FlowsightError::Gateway(format!("Gemini health check failed: {e}")))?;
        Ok(response.status().is_success())
    }
}

/// OpenAI-compatible chat-completions provider
pub struct OpenAiProvider {
    config: LlmConfig,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| FlowsightError::Config("OpenAI API key not set".to_string()))?;

        Ok(Self {
            config: config.clone(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl AiGateway for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "max_tokens": self.config.max_tokens.unwrap_or(2000),
            "temperature": self.config.temperature.unwrap_or(0.3)
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| FlowsightError::Gateway(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FlowsightError::Gateway(format!(
                "OpenAI API error {status}: {error_text}"
            )));
        }

        let response_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FlowsightError::Parse(format!("Failed to parse OpenAI response: {e}")))?;

        response_data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                FlowsightError::Gateway("OpenAI response contained no completion text".to_string())
            })
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| FlowsightError::Gateway(format!("OpenAI health check failed: {e}")))?;
        Ok(response.status().is_success())
    }
}
