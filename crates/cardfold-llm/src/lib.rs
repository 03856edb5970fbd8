//! cardfold-llm - Chat-completion providers for cardfold.
//!
//! cardfold uses a language model for one job: translating flashcard
//! meanings into English before they are categorized.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - GPT-4.1, GPT-4o, etc.
//! - **Ollama** (feature: `ollama`) - Local models via Ollama
//!
//! # Example
//!
//! ```ignore
//! use cardfold_llm::{LlmConfig, LlmFactory, LlmProvider};
//! use cardfold_core::categorize::LlmTranslator;
//!
//! let llm = LlmFactory::create(LlmProvider::OpenAI, LlmConfig::default())?;
//! let translator = LlmTranslator::new(llm, "English");
//! ```

mod factory;
mod ollama;
mod openai;

pub use factory::LlmFactory;
pub use ollama::OllamaLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use cardfold_core::config::LlmProvider;
pub use cardfold_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
