//! Factory for creating LLM providers.

use std::sync::Arc;

use cardfold_core::config::{LlmProvider, LlmProviderConfig};
use cardfold_core::error::CardfoldResult;
use cardfold_core::traits::{Llm, LlmConfig};
use tracing::info;

use crate::ollama::OllamaLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> CardfoldResult<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match provider {
            LlmProvider::OpenAI => Arc::new(OpenAIProvider::new(config)?),
            LlmProvider::Ollama => Arc::new(OllamaLlm::new(config)?),
        };
        info!(provider = ?provider, model = llm.model_name(), "Created LLM provider");
        Ok(llm)
    }

    /// Create an LLM provider from a provider-tagged configuration.
    pub fn from_config(config: &LlmProviderConfig) -> CardfoldResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models() {
        let llm = LlmFactory::create(LlmProvider::Ollama, LlmConfig::default()).unwrap();
        assert_eq!(llm.model_name(), "llama3.1:8b");

        let llm = LlmFactory::create(
            LlmProvider::OpenAI,
            LlmConfig {
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(llm.model_name(), "gpt-4.1-nano-2025-04-14");
    }

    #[test]
    fn test_from_config_keeps_model() {
        let mut config = LlmProviderConfig::default();
        config.provider = LlmProvider::Ollama;
        config.config.model = "qwen2.5:3b".to_string();
        let llm = LlmFactory::from_config(&config).unwrap();
        assert_eq!(llm.model_name(), "qwen2.5:3b");
    }
}
