//! Configuration system for cardfold.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

use crate::error::{CardfoldError, CardfoldResult};
use crate::traits::{EmbedderConfig, EmbedderProvider, LlmConfig};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Ollama,
}

/// Provider configuration with type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            config: LlmConfig {
                model: "gpt-4.1-nano-2025-04-14".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Embedder provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

/// Where flashcards are persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A single pretty-printed JSON document.
    #[default]
    Json,
    /// A SQLite database with users, folders and flashcards tables.
    Sqlite,
}

impl StorageBackend {
    fn default_file_name(&self) -> &'static str {
        match self {
            StorageBackend::Json => "flashcards.json",
            StorageBackend::Sqlite => "flashcards.db",
        }
    }
}

/// Storage configuration.
///
/// A file that omits `path` gets the default file of its `backend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StorageConfigFile")]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

impl StorageConfig {
    /// Storage for `backend` at `path`, or at the backend's default file.
    pub fn new(backend: StorageBackend, path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| data_dir().join(backend.default_file_name())),
            backend,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(StorageBackend::default(), None)
    }
}

/// `[storage]` as written in a config file.
#[derive(Deserialize, Default)]
#[serde(default)]
struct StorageConfigFile {
    backend: StorageBackend,
    path: Option<PathBuf>,
}

impl From<StorageConfigFile> for StorageConfig {
    fn from(file: StorageConfigFile) -> Self {
        Self::new(file.backend, file.path)
    }
}

/// Which categorizer files new cards into folders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CategorizerMode {
    /// No automatic categorization.
    None,
    /// First category whose keyword occurs in the meaning.
    #[default]
    Keyword,
    /// TF-IDF + k-means over the batch of meanings.
    Cluster,
    /// Cosine similarity against averaged keyword embeddings.
    Embedding,
}

/// A category and its exemplar keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategorySpec {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The built-in category set.
pub fn default_categories() -> Vec<CategorySpec> {
    vec![
        CategorySpec::new("Animals", &["animal", "cat", "dog", "puppy", "kitten"]),
        CategorySpec::new("Food", &["food", "eat", "dish", "fruit", "snack"]),
        CategorySpec::new("Objects", &["thing", "object", "tool", "furniture"]),
        CategorySpec::new("Uncategorized", &[]),
    ]
}

/// Categorizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    pub mode: CategorizerMode,
    /// Ordered categories; order breaks ties.
    pub categories: Vec<CategorySpec>,
    /// Label used when nothing matches.
    pub fallback_label: String,
    /// Upper bound on k for the clustering categorizer.
    pub cluster_count: usize,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            mode: CategorizerMode::default(),
            categories: default_categories(),
            fallback_label: "Uncategorized".to_string(),
            cluster_count: 3,
        }
    }
}

/// Translation-before-categorization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub llm: LlmProviderConfig,
    /// Language meanings are translated into.
    pub target_language: String,
    /// JSON file holding cached translations.
    pub cache_path: PathBuf,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            llm: LlmProviderConfig::default(),
            target_language: "English".to_string(),
            cache_path: data_dir().join("translation_cache.json"),
        }
    }
}

/// Behavior switches for the flashcard library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryOptions {
    /// Skip submitted words the user already has.
    pub dedup_words: bool,
    /// Categorize uncategorized cards after every submission.
    pub auto_categorize: bool,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            dedup_words: true,
            auto_categorize: true,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Main cardfold configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CardfoldConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub library: LibraryOptions,
    pub categorizer: CategorizerConfig,
    pub embedder: EmbedderProviderConfig,
    /// Translation is disabled when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationConfig>,
}

/// Default directory for cardfold data files.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".cardfold"))
        .unwrap_or_else(|| PathBuf::from(".cardfold"))
}

impl CardfoldConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> CardfoldResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| CardfoldError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| CardfoldError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| CardfoldError::Configuration(e.to_string())),
            _ => Err(CardfoldError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> CardfoldResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> CardfoldResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server
        if let Some(host) = var("CARDFOLD_HOST") {
            config.server.host = host;
        }
        if let Some(port) = var("CARDFOLD_PORT") {
            config.server.port = port.parse().map_err(|_| {
                CardfoldError::Configuration(format!("CARDFOLD_PORT must be a port number, got '{}'", port))
            })?;
        }

        // Storage
        if let Some(backend) = var("CARDFOLD_STORAGE_BACKEND") {
            config.storage =
                StorageConfig::new(parse_enum("CARDFOLD_STORAGE_BACKEND", &backend)?, None);
        }
        if let Some(path) = var("CARDFOLD_STORAGE_PATH") {
            config.storage.path = PathBuf::from(path);
        }

        // Library
        if let Some(flag) = var("CARDFOLD_DEDUP_WORDS") {
            config.library.dedup_words = parse_flag("CARDFOLD_DEDUP_WORDS", &flag)?;
        }
        if let Some(flag) = var("CARDFOLD_AUTO_CATEGORIZE") {
            config.library.auto_categorize = parse_flag("CARDFOLD_AUTO_CATEGORIZE", &flag)?;
        }

        // Categorizer
        if let Some(mode) = var("CARDFOLD_CATEGORIZER") {
            config.categorizer.mode = parse_enum("CARDFOLD_CATEGORIZER", &mode)?;
        }
        if let Some(label) = var("CARDFOLD_FALLBACK_LABEL") {
            config.categorizer.fallback_label = label;
        }
        if let Some(count) = var("CARDFOLD_CLUSTER_COUNT") {
            config.categorizer.cluster_count = count.parse().map_err(|_| {
                CardfoldError::Configuration(format!(
                    "CARDFOLD_CLUSTER_COUNT must be a positive integer, got '{}'",
                    count
                ))
            })?;
        }

        // Embedder
        if let Some(provider) = var("CARDFOLD_EMBEDDER_PROVIDER") {
            config.embedder.provider = match provider.to_lowercase().as_str() {
                "openai" => EmbedderProvider::OpenAI,
                "ollama" => EmbedderProvider::Ollama,
                other => {
                    return Err(CardfoldError::UnsupportedProvider {
                        provider: other.to_string(),
                    })
                }
            };
        }
        if let Some(model) = var("CARDFOLD_EMBEDDER_MODEL") {
            config.embedder.config.model = model;
        }
        if let Some(dims) = var("CARDFOLD_EMBEDDER_DIMS") {
            config.embedder.config.embedding_dims = dims.parse().map_err(|_| {
                CardfoldError::Configuration(format!(
                    "CARDFOLD_EMBEDDER_DIMS must be an integer, got '{}'",
                    dims
                ))
            })?;
        }
        if let Some(base_url) = var("CARDFOLD_EMBEDDER_BASE_URL") {
            config.embedder.config.base_url = Some(base_url);
        }
        let api_key = var("OPENAI_API_KEY");
        if let Some(ref key) = api_key {
            config.embedder.config.api_key = Some(key.clone());
        }

        // Translation
        let translate = match var("CARDFOLD_TRANSLATE") {
            Some(flag) => parse_flag("CARDFOLD_TRANSLATE", &flag)?,
            None => false,
        };
        if translate {
            let mut translation = TranslationConfig::default();
            if let Some(provider) = var("CARDFOLD_TRANSLATION_PROVIDER") {
                translation.llm.provider = match provider.to_lowercase().as_str() {
                    "openai" => LlmProvider::OpenAI,
                    "ollama" => LlmProvider::Ollama,
                    other => {
                        return Err(CardfoldError::UnsupportedProvider {
                            provider: other.to_string(),
                        })
                    }
                };
            }
            if let Some(model) = var("CARDFOLD_TRANSLATION_MODEL") {
                translation.llm.config.model = model;
            }
            if let Some(base_url) = var("CARDFOLD_TRANSLATION_BASE_URL") {
                translation.llm.config.base_url = Some(base_url);
            }
            if let Some(language) = var("CARDFOLD_TRANSLATION_LANGUAGE") {
                translation.target_language = language;
            }
            if let Some(path) = var("CARDFOLD_TRANSLATION_CACHE_PATH") {
                translation.cache_path = PathBuf::from(path);
            }
            translation.llm.config.api_key = api_key;
            config.translation = Some(translation);
        }

        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> CardfoldResult<()> {
        if self.categorizer.fallback_label.trim().is_empty() {
            return Err(CardfoldError::Configuration(
                "categorizer.fallback_label must not be empty".to_string(),
            ));
        }
        if self.categorizer.mode == CategorizerMode::Cluster && self.categorizer.cluster_count == 0
        {
            return Err(CardfoldError::Configuration(
                "categorizer.cluster_count must be at least 1".to_string(),
            ));
        }
        if let Some(empty) = self
            .categorizer
            .categories
            .iter()
            .find(|c| c.name.trim().is_empty())
        {
            return Err(CardfoldError::Configuration(format!(
                "category names must not be empty (keywords: {:?})",
                empty.keywords
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> CardfoldResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CardfoldError::Configuration(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

fn parse_enum<T: std::str::FromStr>(key: &str, value: &str) -> CardfoldResult<T> {
    value.trim().parse().map_err(|_| {
        CardfoldError::Configuration(format!("{} has unsupported value '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CardfoldConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert!(config.storage.path.ends_with("flashcards.json"));
        assert!(config.library.dedup_words);
        assert_eq!(config.categorizer.mode, CategorizerMode::Keyword);
        assert_eq!(config.categorizer.categories.len(), 4);
        assert!(config.translation.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CardfoldConfig::from_lookup(lookup(&[
            ("CARDFOLD_PORT", "9000"),
            ("CARDFOLD_STORAGE_BACKEND", "SQLite"),
            ("CARDFOLD_CATEGORIZER", "embedding"),
            ("CARDFOLD_DEDUP_WORDS", "off"),
            ("CARDFOLD_TRANSLATE", "true"),
            ("CARDFOLD_TRANSLATION_PROVIDER", "ollama"),
            ("CARDFOLD_TRANSLATION_MODEL", "llama3.1"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.path.ends_with("flashcards.db"));
        assert_eq!(config.categorizer.mode, CategorizerMode::Embedding);
        assert!(!config.library.dedup_words);
        assert_eq!(config.embedder.config.api_key.as_deref(), Some("sk-test"));

        let translation = config.translation.unwrap();
        assert_eq!(translation.llm.provider, LlmProvider::Ollama);
        assert_eq!(translation.llm.config.model, "llama3.1");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(CardfoldConfig::from_lookup(lookup(&[("CARDFOLD_PORT", "http")])).is_err());
        assert!(CardfoldConfig::from_lookup(lookup(&[("CARDFOLD_CATEGORIZER", "magic")])).is_err());
        assert!(
            CardfoldConfig::from_lookup(lookup(&[("CARDFOLD_EMBEDDER_PROVIDER", "cohere")]))
                .is_err()
        );
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardfold.toml");
        std::fs::write(
            &path,
            r#"
[storage]
backend = "sqlite"
path = "/tmp/cards.db"

[categorizer]
mode = "cluster"
cluster_count = 5

[[categorizer.categories]]
name = "Verbs"
keywords = ["to run", "to eat"]
"#,
        )
        .unwrap();

        let config = CardfoldConfig::from_file(&path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.categorizer.mode, CategorizerMode::Cluster);
        assert_eq!(config.categorizer.cluster_count, 5);
        assert_eq!(config.categorizer.categories.len(), 1);
        assert_eq!(config.categorizer.fallback_label, "Uncategorized");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_storage_path_follows_backend() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("sqlite.toml");
        std::fs::write(&path, "[storage]\nbackend = \"sqlite\"\n").unwrap();
        let config = CardfoldConfig::from_file(&path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.path.ends_with("flashcards.db"));

        let path = dir.path().join("json.yaml");
        std::fs::write(&path, "storage:\n  path: /tmp/mine.json\n").unwrap();
        let config = CardfoldConfig::from_file(&path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/mine.json"));

        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();
        let config = CardfoldConfig::from_file(&path).unwrap();
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardfold.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(CardfoldConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_clusters() {
        let mut config = CardfoldConfig::default();
        config.categorizer.mode = CategorizerMode::Cluster;
        config.categorizer.cluster_count = 0;
        assert!(config.validate().is_err());
    }
}
