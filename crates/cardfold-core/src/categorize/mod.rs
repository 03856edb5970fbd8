//! Automatic filing of flashcards into folders.
//!
//! A [`Categorizer`] maps a card's meaning to a folder label:
//! - [`KeywordCategorizer`]: first category with a keyword in the meaning.
//! - [`ClusterCategorizer`]: TF-IDF + k-means over a batch of meanings.
//! - [`EmbeddingCategorizer`]: nearest averaged keyword embedding.
//!
//! Any of them can be wrapped in a [`TranslatingCategorizer`] so meanings are
//! translated before they are categorized.

mod cluster;
mod embedding;
mod keyword;
mod translate;
pub mod vector;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{CategorizerConfig, CategorizerMode};
use crate::error::{CardfoldError, CardfoldResult};
use crate::traits::Embedder;

pub use cluster::ClusterCategorizer;
pub use embedding::EmbeddingCategorizer;
pub use keyword::KeywordCategorizer;
pub use translate::{
    CachingTranslator, LlmTranslator, TranslatingCategorizer, TranslationCache, Translator,
};

/// Assigns folder labels to flashcard meanings.
#[async_trait]
pub trait Categorizer: Send + Sync {
    /// Label for a single meaning.
    async fn categorize(&self, meaning: &str) -> CardfoldResult<String>;

    /// Labels for several meanings, in input order.
    async fn categorize_batch(&self, meanings: &[String]) -> CardfoldResult<Vec<String>> {
        // Default implementation: one call per meaning
        let mut labels = Vec::with_capacity(meanings.len());
        for meaning in meanings {
            labels.push(self.categorize(meaning).await?);
        }
        Ok(labels)
    }

    /// Whether `label` only identifies a group within the batch that produced
    /// it. Such labels are filed into new folders instead of being matched to
    /// existing folders by name.
    fn is_batch_label(&self, _label: &str) -> bool {
        false
    }

    /// Short name used in logs and the health endpoint.
    fn name(&self) -> &'static str;
}

/// Build the categorizer selected by the configuration.
///
/// Returns `Ok(None)` for [`CategorizerMode::None`]. The embedding mode needs
/// an embedder.
pub fn from_config(
    config: &CategorizerConfig,
    embedder: Option<Arc<dyn Embedder>>,
) -> CardfoldResult<Option<Arc<dyn Categorizer>>> {
    let categorizer: Arc<dyn Categorizer> = match config.mode {
        CategorizerMode::None => return Ok(None),
        CategorizerMode::Keyword => Arc::new(KeywordCategorizer::new(
            &config.categories,
            config.fallback_label.clone(),
        )),
        CategorizerMode::Cluster => Arc::new(ClusterCategorizer::new(
            config.cluster_count,
            config.fallback_label.clone(),
        )),
        CategorizerMode::Embedding => {
            let embedder = embedder.ok_or_else(|| {
                CardfoldError::Configuration(
                    "embedding categorizer requires an embedder".to_string(),
                )
            })?;
            Arc::new(EmbeddingCategorizer::new(
                embedder,
                config.categories.clone(),
                config.fallback_label.clone(),
            ))
        }
    };
    Ok(Some(categorizer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_modes() {
        let mut config = CategorizerConfig::default();
        let categorizer = from_config(&config, None).unwrap().unwrap();
        assert_eq!(categorizer.name(), "keyword");

        config.mode = CategorizerMode::Cluster;
        let categorizer = from_config(&config, None).unwrap().unwrap();
        assert_eq!(categorizer.name(), "cluster");

        config.mode = CategorizerMode::None;
        assert!(from_config(&config, None).unwrap().is_none());
    }

    #[test]
    fn test_embedding_mode_requires_embedder() {
        let config = CategorizerConfig {
            mode: CategorizerMode::Embedding,
            ..Default::default()
        };
        let err = from_config(&config, None).err().unwrap();
        assert!(matches!(err, CardfoldError::Configuration(_)));
    }
}
