//! cardfold-core - Core library for cardfold.
//!
//! This crate provides the types, stores, categorizers and the [`Library`]
//! behind the cardfold flashcard service.
//!
//! # Example
//!
//! ```ignore
//! use cardfold_core::{categorize, open_store, CardfoldConfig, Library};
//!
//! let config = CardfoldConfig::default();
//! let store = open_store(&config.storage)?;
//! let categorizer = categorize::from_config(&config.categorizer, None)?;
//! let library = Library::new(store, categorizer, config.library);
//!
//! // Add cards; new cards are filed into folders automatically
//! let outcome = library.submit_words("local", "perro: dog\nmanzana: apple").await?;
//!
//! // Everything grouped by folder
//! let overview = library.overview("local")?;
//! ```

pub mod categorize;
pub mod config;
pub mod error;
pub mod library;
pub mod parse;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use categorize::Categorizer;
pub use config::{CardfoldConfig, CategorizerMode, LibraryOptions, StorageBackend};
pub use error::{CardfoldError, CardfoldResult, ErrorCode};
pub use library::{Library, ReviewDeck, SubmitOutcome};
pub use parse::{parse_word_list, WordEntry};
pub use store::{open_store, FlashcardStore};
pub use traits::{Embedder, EmbedderConfig, Llm, LlmConfig};
pub use types::{
    Flashcard, Folder, FolderWithCards, LibraryOverview, Message, MessageRole, MoveTarget,
    NewFlashcard, User, DEFAULT_USER_ID,
};
