//! Persistence for users, folders and flashcards.
//!
//! Two backends implement [`FlashcardStore`]:
//! - [`JsonFileStore`]: one JSON document rewritten on every change.
//! - [`SqliteStore`]: relational tables with foreign keys.

mod json;
mod sqlite;

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::CardfoldResult;
use crate::types::{Flashcard, Folder, NewFlashcard, User};

pub use json::{JsonFileStore, StoreDocument};
pub use sqlite::SqliteStore;

/// Trait for flashcard storage operations.
///
/// Every lookup is scoped by `user_id`; a record owned by another user is
/// treated as absent.
pub trait FlashcardStore: Send + Sync {
    /// Create the user if it does not exist yet and return it.
    fn ensure_user(&self, user_id: &str) -> CardfoldResult<User>;

    /// Get a user by id.
    fn get_user(&self, user_id: &str) -> CardfoldResult<Option<User>>;

    /// Insert cards for a user, returning them with their assigned ids.
    fn insert_flashcards(
        &self,
        user_id: &str,
        cards: &[NewFlashcard],
    ) -> CardfoldResult<Vec<Flashcard>>;

    /// Get one card.
    fn get_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<Option<Flashcard>>;

    /// All cards of a user, in id order.
    fn list_flashcards(&self, user_id: &str) -> CardfoldResult<Vec<Flashcard>>;

    /// Set or clear a card's folder. Returns `None` if the card does not exist.
    fn set_flashcard_folder(
        &self,
        user_id: &str,
        card_id: i64,
        folder_id: Option<Uuid>,
    ) -> CardfoldResult<Option<Flashcard>>;

    /// Delete a card. Returns whether it existed.
    fn delete_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<bool>;

    /// Persist a new folder.
    fn create_folder(&self, folder: &Folder) -> CardfoldResult<()>;

    /// Get one folder.
    fn get_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<Option<Folder>>;

    /// Find a folder by its exact name. The oldest match wins.
    fn find_folder_by_name(&self, user_id: &str, name: &str) -> CardfoldResult<Option<Folder>>;

    /// All folders of a user, in creation order.
    fn list_folders(&self, user_id: &str) -> CardfoldResult<Vec<Folder>>;

    /// Un-file the folder's cards and delete it. Returns whether it existed.
    fn delete_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<bool>;
}

/// Open the store selected by the configuration.
pub fn open_store(config: &StorageConfig) -> CardfoldResult<Arc<dyn FlashcardStore>> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store: Arc<dyn FlashcardStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::open(&config.path)?),
        StorageBackend::Sqlite => Arc::new(SqliteStore::new(&config.path)?),
    };

    info!(
        backend = %config.backend,
        path = %config.path.display(),
        "Opened flashcard store"
    );
    Ok(store)
}
