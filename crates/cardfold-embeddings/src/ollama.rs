//! Ollama embedding provider implementation.

use async_trait::async_trait;

use cardfold_core::error::{CardfoldError, CardfoldResult};
use cardfold_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "ollama")]
use ollama_rs::{
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
    Ollama,
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama embedding provider.
pub struct OllamaEmbedder {
    #[cfg(feature = "ollama")]
    client: Ollama,
    config: EmbedderConfig,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(config: EmbedderConfig) -> CardfoldResult<Self> {
        let (host, port) = parse_base_url(config.base_url.as_deref())?;

        #[cfg(feature = "ollama")]
        let client = Ollama::new(host, port);
        #[cfg(not(feature = "ollama"))]
        let _ = (host, port);

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            config,
        })
    }

    #[cfg(feature = "ollama")]
    async fn request(&self, input: EmbeddingsInput) -> CardfoldResult<Vec<Vec<f32>>> {
        let request = GenerateEmbeddingsRequest::new(self.config.model.clone(), input);
        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| CardfoldError::embedding(format!("Ollama embedding error: {}", e)))?;
        Ok(response.embeddings)
    }
}

/// Split a base URL into the scheme+host and port `Ollama::new` expects.
fn parse_base_url(base_url: Option<&str>) -> CardfoldResult<(String, u16)> {
    let url = url::Url::parse(base_url.unwrap_or(DEFAULT_OLLAMA_URL))
        .map_err(|e| CardfoldError::Configuration(format!("Invalid Ollama URL: {}", e)))?;

    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(11434);
    Ok((format!("{}://{}", url.scheme(), host), port))
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[cfg(feature = "ollama")]
    async fn embed(&self, text: &str) -> CardfoldResult<Vec<f32>> {
        self.request(EmbeddingsInput::Single(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CardfoldError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "ollama"))]
    async fn embed(&self, _text: &str) -> CardfoldResult<Vec<f32>> {
        Err(CardfoldError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    #[cfg(feature = "ollama")]
    async fn embed_batch(&self, texts: &[String]) -> CardfoldResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(EmbeddingsInput::Multiple(texts.to_vec())).await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
