use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use super::callstack::stack_from_raw;
use super::flowchart::{decode_steps, map_steps, validate_steps, FlowchartGraph};
use super::llm::{create_gateway, AiGateway};
use super::parser::parse_json_array;
use super::prompts;

/// Orchestrates the analysis pipeline: prompt construction, gateway
/// invocation, response parsing, and graph-shape derivation.
///
/// All three operations are stateless request/response; nothing is
/// retained between calls.
pub struct Engine {
    config: Config,
    gateway: Arc<dyn AiGateway>,
}

impl Engine {
    /// Create an engine from a config file path (or the defaults).
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!("Loaded configuration: {:?}", config);

        let gateway = create_gateway(&config.llm)?;
        info!(
            "AI gateway ready: {} ({})",
            gateway.provider_name(),
            gateway.model_name()
        );

        Ok(Self { config, gateway })
    }

    /// Create an engine with an explicit gateway, for tests and embedding.
    pub fn with_gateway(config: Config, gateway: Arc<dyn AiGateway>) -> Self {
        Self { config, gateway }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn AiGateway> {
        &self.gateway
    }

    /// Natural-language explanation of the submitted code.
    pub async fn explain(&self, code: &str, language: &str) -> crate::error::Result<String> {
        let prompt = prompts::explain_prompt(code, language);
        self.gateway.generate(&prompt).await
    }

    /// Renderer-ready flowchart derived from the submitted code.
    ///
    /// Parse failures degrade to an empty graph; only gateway failures
    /// propagate as errors.
    pub async fn flowchart(&self, code: &str, language: &str) -> crate::error::Result<FlowchartGraph> {
        let prompt = prompts::flowchart_prompt(code, language);
        let raw = self.gateway.generate(&prompt).await?;
        let steps = validate_steps(decode_steps(parse_json_array(&raw)));
        Ok(map_steps(&steps))
    }

    /// Ordered function-name listing derived from the submitted code.
    pub async fn call_stack(&self, code: &str, language: &str) -> crate::error::Result<Vec<String>> {
        let prompt = prompts::call_stack_prompt(code, language);
        let raw = self.gateway.generate(&prompt).await?;
        Ok(stack_from_raw(&raw))
    }
}
