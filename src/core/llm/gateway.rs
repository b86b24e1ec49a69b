use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{FlowsightError, Result};
use super::providers::{GeminiProvider, OpenAiProvider};

/// A generative-language endpoint that turns a prompt into text.
///
/// Implementations must treat the completion as unstructured even when the
/// prompt requested JSON: the model may prepend prose, omit fields, or emit
/// invalid syntax. Callers own all parsing and validation.
#[async_trait::async_trait]
pub trait AiGateway: Send + Sync {
    /// Return the model's textual completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logs (e.g., "Google Gemini")
    fn provider_name(&self) -> &str;

    /// Model name being used
    fn model_name(&self) -> &str;

    /// Check that the provider is usable (API key set, service reachable)
    async fn health_check(&self) -> Result<bool>;
}

/// Factory for the configured gateway implementation.
///
/// The gateway is constructed once and injected wherever it is needed, so
/// tests can substitute a double for the real endpoint.
pub fn create_gateway(config: &LlmConfig) -> Result<Arc<dyn AiGateway>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        other => Err(FlowsightError::Config(format!(
            "Unsupported LLM provider: {other}"
        ))),
    }
}
