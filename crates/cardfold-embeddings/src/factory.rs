//! Factory for creating embedding providers.

use std::sync::Arc;

use cardfold_core::config::EmbedderProviderConfig;
use cardfold_core::error::CardfoldResult;
use cardfold_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
use tracing::info;

use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAIEmbedder;

/// Factory for creating embedding providers.
pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Create an embedder from the given configuration.
    pub fn create(
        provider: EmbedderProvider,
        config: EmbedderConfig,
    ) -> CardfoldResult<Arc<dyn Embedder>> {
        let embedder: Arc<dyn Embedder> = match provider {
            EmbedderProvider::OpenAI => Arc::new(OpenAIEmbedder::new(config)?),
            EmbedderProvider::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        };
        info!(
            provider = ?provider,
            model = embedder.model_name(),
            dims = embedder.dimension(),
            "Created embedder"
        );
        Ok(embedder)
    }

    /// Create an embedder from the `embedder` section of the configuration.
    pub fn from_config(config: &EmbedderProviderConfig) -> CardfoldResult<Arc<dyn Embedder>> {
        Self::create(config.provider, config.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardfold_core::CardfoldError;

    #[test]
    fn test_create_from_config() {
        let config = EmbedderProviderConfig {
            provider: EmbedderProvider::OpenAI,
            config: EmbedderConfig {
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            },
        };
        let embedder = EmbedderFactory::from_config(&config).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
        assert_eq!(embedder.dimension(), 1536);
    }

    #[test]
    fn test_ollama_defaults() {
        let config = EmbedderConfig {
            model: "all-minilm".to_string(),
            embedding_dims: 384,
            ..Default::default()
        };
        let embedder = EmbedderFactory::create(EmbedderProvider::Ollama, config).unwrap();
        assert_eq!(embedder.model_name(), "all-minilm");
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    fn test_ollama_rejects_bad_url() {
        let config = EmbedderConfig {
            model: "all-minilm".to_string(),
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = EmbedderFactory::create(EmbedderProvider::Ollama, config).err().unwrap();
        assert!(matches!(err, CardfoldError::Configuration(_)));
    }
}
