//! Factory for creating a Library from configuration.

use std::sync::Arc;

use cardfold_core::categorize::{
    self, CachingTranslator, Categorizer, LlmTranslator, TranslatingCategorizer, TranslationCache,
};
use cardfold_core::config::{CardfoldConfig, CategorizerMode, TranslationConfig};
use cardfold_core::error::CardfoldResult;
use cardfold_core::library::Library;
use cardfold_core::store::open_store;
use cardfold_core::traits::Embedder;
use cardfold_embeddings::EmbedderFactory;
use cardfold_llm::LlmFactory;
use tracing::info;

/// Create a Library instance from configuration.
pub fn create_library(config: &CardfoldConfig) -> CardfoldResult<Library> {
    config.validate()?;

    // Create store
    let store = open_store(&config.storage)?;

    // Create categorizer (optional)
    let categorizer = create_categorizer(config)?;

    info!(
        categorizer = categorizer.as_ref().map(|c| c.name()).unwrap_or("none"),
        translation = config.translation.is_some(),
        auto_categorize = config.library.auto_categorize,
        "Library configured"
    );
    Ok(Library::new(store, categorizer, config.library))
}

fn create_categorizer(config: &CardfoldConfig) -> CardfoldResult<Option<Arc<dyn Categorizer>>> {
    // Only the embedding categorizer needs an embedder
    let embedder: Option<Arc<dyn Embedder>> = match config.categorizer.mode {
        CategorizerMode::Embedding => Some(EmbedderFactory::from_config(&config.embedder)?),
        _ => None,
    };

    let Some(categorizer) = categorize::from_config(&config.categorizer, embedder)? else {
        return Ok(None);
    };

    match config.translation {
        Some(ref translation) => Ok(Some(with_translation(categorizer, translation)?)),
        None => Ok(Some(categorizer)),
    }
}

fn with_translation(
    categorizer: Arc<dyn Categorizer>,
    config: &TranslationConfig,
) -> CardfoldResult<Arc<dyn Categorizer>> {
    let llm = LlmFactory::from_config(&config.llm)?;
    let translator = Arc::new(LlmTranslator::new(llm, config.target_language.clone()));
    let cache = TranslationCache::load(&config.cache_path)?;
    info!(
        cache_path = %config.cache_path.display(),
        cached = cache.len(),
        language = %config.target_language,
        "Translation enabled"
    );

    Ok(Arc::new(TranslatingCategorizer::new(
        categorizer,
        CachingTranslator::new(translator, cache),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardfold_core::config::StorageBackend;

    fn config(dir: &tempfile::TempDir) -> CardfoldConfig {
        let mut config = CardfoldConfig::default();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = dir.path().join("flashcards.db");
        config
    }

    #[test]
    fn test_default_library_uses_keyword_categorizer() {
        let dir = tempfile::tempdir().unwrap();
        let library = create_library(&config(&dir)).unwrap();
        assert_eq!(library.categorizer_name(), Some("keyword"));
    }

    #[test]
    fn test_no_categorizer() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.categorizer.mode = CategorizerMode::None;
        let library = create_library(&config).unwrap();
        assert_eq!(library.categorizer_name(), None);
    }

    #[test]
    fn test_translation_wraps_categorizer() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        let mut translation = TranslationConfig::default();
        translation.llm.config.api_key = Some("sk-test".to_string());
        translation.cache_path = dir.path().join("translation_cache.json");
        config.translation = Some(translation);

        let library = create_library(&config).unwrap();
        assert_eq!(library.categorizer_name(), Some("keyword"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.categorizer.fallback_label = "  ".to_string();
        assert!(create_library(&config).is_err());
    }
}
