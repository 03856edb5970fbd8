//! Translation in front of a categorizer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::Categorizer;
use crate::error::{CardfoldError, CardfoldResult, ErrorCode};
use crate::traits::{GenerationOptions, Llm};
use crate::types::Message;

/// Translates free text into a fixed target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> CardfoldResult<String>;
}

/// Translator backed by a chat-completion model.
pub struct LlmTranslator {
    llm: Arc<dyn Llm>,
    target_language: String,
}

impl LlmTranslator {
    pub fn new(llm: Arc<dyn Llm>, target_language: impl Into<String>) -> Self {
        Self {
            llm,
            target_language: target_language.into(),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You translate dictionary definitions into {lang}. \
             Reply with the {lang} translation only, without quotes or commentary. \
             If the text is already in {lang}, repeat it unchanged.",
            lang = self.target_language
        )
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str) -> CardfoldResult<String> {
        let messages = vec![Message::system(self.system_prompt()), Message::user(text)];
        let options = GenerationOptions {
            temperature: Some(0.0),
            ..Default::default()
        };

        let response = self.llm.generate(&messages, Some(options)).await?;
        let translated = response
            .content_or_empty()
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();

        if translated.is_empty() {
            return Err(CardfoldError::Llm {
                message: format!("{} returned an empty translation", self.llm.model_name()),
                code: ErrorCode::LlmEmptyResponse,
                source: None,
            });
        }
        Ok(translated.to_string())
    }
}

#[derive(Default)]
struct CacheState {
    entries: BTreeMap<String, String>,
    dirty: bool,
}

/// Translations keyed by the original meaning, optionally backed by a JSON
/// object file.
pub struct TranslationCache {
    path: Option<PathBuf>,
    state: Mutex<CacheState>,
}

impl TranslationCache {
    /// Load the cache file, starting empty if it does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> CardfoldResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| CardfoldError::Parse {
                message: format!("invalid translation cache {}: {}", path.display(), e),
                code: ErrorCode::ParseInvalidJson,
            })?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Loaded translation cache");
        Ok(Self {
            path: Some(path),
            state: Mutex::new(CacheState {
                entries,
                dirty: false,
            }),
        })
    }

    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, text: &str) -> Option<String> {
        self.state().entries.get(text).cloned()
    }

    pub fn insert(&self, text: impl Into<String>, translation: impl Into<String>) {
        let mut state = self.state();
        state.entries.insert(text.into(), translation.into());
        state.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the cache file if anything changed since the last save.
    pub fn save(&self) -> CardfoldResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut state = self.state();
        if !state.dirty {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&state.entries)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;

        state.dirty = false;
        debug!(path = %path.display(), entries = state.entries.len(), "Saved translation cache");
        Ok(())
    }
}

/// A translator consulted through a cache.
pub struct CachingTranslator {
    translator: Arc<dyn Translator>,
    cache: TranslationCache,
}

impl CachingTranslator {
    pub fn new(translator: Arc<dyn Translator>, cache: TranslationCache) -> Self {
        Self { translator, cache }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Translate `text`, returning it unchanged if translation fails.
    ///
    /// Failures are not cached, so the next call tries again.
    pub async fn translate_or_original(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        if let Some(hit) = self.cache.get(text) {
            return hit;
        }

        match self.translator.translate(text).await {
            Ok(translated) => {
                debug!(original = text, translated = %translated, "Translated meaning");
                self.cache.insert(text, translated.clone());
                translated
            }
            Err(e) => {
                warn!(error = %e, text, "Translation failed, using original text");
                text.to_string()
            }
        }
    }
}

/// Translates meanings before handing them to another categorizer.
pub struct TranslatingCategorizer {
    inner: Arc<dyn Categorizer>,
    translator: CachingTranslator,
}

impl TranslatingCategorizer {
    pub fn new(inner: Arc<dyn Categorizer>, translator: CachingTranslator) -> Self {
        Self { inner, translator }
    }

    fn persist(&self) {
        if let Err(e) = self.translator.cache().save() {
            warn!(error = %e, "Failed to save translation cache");
        }
    }
}

#[async_trait]
impl Categorizer for TranslatingCategorizer {
    async fn categorize(&self, meaning: &str) -> CardfoldResult<String> {
        let translated = self.translator.translate_or_original(meaning).await;
        self.persist();
        self.inner.categorize(&translated).await
    }

    async fn categorize_batch(&self, meanings: &[String]) -> CardfoldResult<Vec<String>> {
        let mut translated = Vec::with_capacity(meanings.len());
        for meaning in meanings {
            translated.push(self.translator.translate_or_original(meaning).await);
        }
        self.persist();
        info!(
            meanings = meanings.len(),
            cached = self.translator.cache().len(),
            "Translated meanings for categorization"
        );
        self.inner.categorize_batch(&translated).await
    }

    fn is_batch_label(&self, label: &str) -> bool {
        self.inner.is_batch_label(label)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
