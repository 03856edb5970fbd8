//! cardfold-embeddings - Embedding provider implementations for cardfold.
//!
//! Embeddings drive the `embedding` categorizer, which files a flashcard
//! under the category whose keywords embed closest to the card's meaning.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small, text-embedding-3-large, etc.
//! - **Ollama** (feature: `ollama`) - Local embedding models via Ollama
//!
//! # Example
//!
//! ```ignore
//! use cardfold_core::CardfoldConfig;
//! use cardfold_embeddings::{EmbedderConfig, EmbedderFactory, EmbedderProvider};
//!
//! // Whatever the `embedder` section of the configuration selects
//! let config = CardfoldConfig::from_env()?;
//! let embedder = EmbedderFactory::from_config(&config.embedder)?;
//!
//! // A local sentence-transformer served by Ollama
//! let config = EmbedderConfig {
//!     model: "all-minilm".to_string(),
//!     embedding_dims: 384,
//!     ..Default::default()
//! };
//! let embedder = EmbedderFactory::create(EmbedderProvider::Ollama, config)?;
//! ```

mod factory;
mod ollama;
mod openai;

pub use factory::EmbedderFactory;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

// Re-export core types for convenience
pub use cardfold_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
