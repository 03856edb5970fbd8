//! Core traits for cardfold providers.

mod embedder;
mod llm;

pub use embedder::*;
pub use llm::*;
