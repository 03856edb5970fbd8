//! OpenAI embedding provider implementation.

use async_trait::async_trait;

use cardfold_core::error::{CardfoldError, CardfoldResult, ErrorCode};
use cardfold_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: EmbedderConfig) -> CardfoldResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                CardfoldError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        #[cfg(feature = "openai")]
        let openai_config = match config.base_url {
            Some(ref base_url) => OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(base_url),
            None => OpenAIConfig::new().with_api_key(api_key),
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        Ok(Self {
            #[cfg(feature = "openai")]
            client: Client::with_config(openai_config),
            config,
        })
    }

    /// Only the text-embedding-3 family accepts a requested size.
    #[cfg(feature = "openai")]
    fn requested_dimensions(&self) -> Option<u32> {
        self.config
            .model
            .starts_with("text-embedding-3")
            .then_some(self.config.embedding_dims as u32)
    }

    fn check_dimension(&self, embedding: &[f32]) -> CardfoldResult<()> {
        if embedding.len() != self.config.embedding_dims {
            return Err(CardfoldError::Embedding {
                message: format!(
                    "{} returned {} dimensions, expected {}",
                    self.config.model,
                    embedding.len(),
                    self.config.embedding_dims
                ),
                code: ErrorCode::EmbDimensionMismatch,
                source: None,
            });
        }
        Ok(())
    }

    #[cfg(feature = "openai")]
    async fn request(&self, input: EmbeddingInput) -> CardfoldResult<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input,
            dimensions: self.requested_dimensions(),
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| CardfoldError::embedding(format!("OpenAI embedding error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|e| e.embedding).collect();
        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str) -> CardfoldResult<Vec<f32>> {
        self.request(EmbeddingInput::String(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CardfoldError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str) -> CardfoldResult<Vec<f32>> {
        Err(CardfoldError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_batch(&self, texts: &[String]) -> CardfoldResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .request(EmbeddingInput::StringArray(texts.to_vec()))
            .await?;
        if embeddings.len() != texts.len() {
            return Err(CardfoldError::embedding(format!(
                "OpenAI returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(dims: usize) -> OpenAIEmbedder {
        OpenAIEmbedder::new(EmbedderConfig {
            embedding_dims: dims,
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_check_dimension() {
        let embedder = embedder(3);
        assert!(embedder.check_dimension(&[0.1, 0.2, 0.3]).is_ok());
        let err = embedder.check_dimension(&[0.1]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmbDimensionMismatch);
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_requested_dimensions_only_for_v3_models() {
        assert_eq!(embedder(512).requested_dimensions(), Some(512));

        let legacy = OpenAIEmbedder::new(EmbedderConfig {
            model: "text-embedding-ada-002".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(legacy.requested_dimensions(), None);
    }
}
