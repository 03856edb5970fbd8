//! JSON file backend.
//!
//! The whole store is one document:
//! ```text
//! { "next_id": 4, "users": [...], "folders": [...], "flashcards": [...] }
//! ```
//! Changes are applied to a copy, written to `<path>.tmp`, renamed over the
//! original and only then made visible.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::FlashcardStore;
use crate::error::{CardfoldError, CardfoldResult};
use crate::types::{Flashcard, Folder, NewFlashcard, User};

/// On-disk layout of the JSON store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    /// Id the next inserted flashcard receives.
    pub next_id: i64,
    pub users: Vec<User>,
    pub folders: Vec<Folder>,
    pub flashcards: Vec<Flashcard>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            next_id: 1,
            users: Vec::new(),
            folders: Vec::new(),
            flashcards: Vec::new(),
        }
    }
}

impl StoreDocument {
    fn ensure_user(&mut self, user_id: &str) -> User {
        if let Some(user) = self.users.iter().find(|u| u.id == user_id) {
            return user.clone();
        }
        let user = User::new(user_id);
        self.users.push(user.clone());
        user
    }
}

/// Flashcard store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<StoreDocument>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> CardfoldResult<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                StoreDocument::default()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    CardfoldError::parse(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            StoreDocument::default()
        };

        debug!(
            path = %path.display(),
            flashcards = doc.flashcards.len(),
            folders = doc.folders.len(),
            "Loaded JSON store"
        );

        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> CardfoldResult<StoreDocument> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> CardfoldResult<std::sync::MutexGuard<'_, StoreDocument>> {
        self.doc
            .lock()
            .map_err(|e| CardfoldError::poisoned(e.to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&StoreDocument) -> T) -> CardfoldResult<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreDocument) -> T) -> CardfoldResult<T> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let result = f(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(result)
    }

    fn persist(&self, doc: &StoreDocument) -> CardfoldResult<()> {
        let content = serde_json::to_string_pretty(doc)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FlashcardStore for JsonFileStore {
    fn ensure_user(&self, user_id: &str) -> CardfoldResult<User> {
        if let Some(user) = self.get_user(user_id)? {
            return Ok(user);
        }
        self.write(|doc| doc.ensure_user(user_id))
    }

    fn get_user(&self, user_id: &str) -> CardfoldResult<Option<User>> {
        self.read(|doc| doc.users.iter().find(|u| u.id == user_id).cloned())
    }

    fn insert_flashcards(
        &self,
        user_id: &str,
        cards: &[NewFlashcard],
    ) -> CardfoldResult<Vec<Flashcard>> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }
        self.write(|doc| {
            doc.ensure_user(user_id);
            let now = Utc::now();
            let mut inserted = Vec::with_capacity(cards.len());
            for card in cards {
                let flashcard = Flashcard {
                    id: doc.next_id,
                    user_id: user_id.to_string(),
                    word: card.word.clone(),
                    meaning: card.meaning.clone(),
                    folder_id: card.folder_id,
                    created_at: now,
                };
                doc.next_id += 1;
                doc.flashcards.push(flashcard.clone());
                inserted.push(flashcard);
            }
            inserted
        })
    }

    fn get_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<Option<Flashcard>> {
        self.read(|doc| {
            doc.flashcards
                .iter()
                .find(|c| c.id == card_id && c.user_id == user_id)
                .cloned()
        })
    }

    fn list_flashcards(&self, user_id: &str) -> CardfoldResult<Vec<Flashcard>> {
        self.read(|doc| {
            let mut cards: Vec<Flashcard> = doc
                .flashcards
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            cards.sort_by_key(|c| c.id);
            cards
        })
    }

    fn set_flashcard_folder(
        &self,
        user_id: &str,
        card_id: i64,
        folder_id: Option<Uuid>,
    ) -> CardfoldResult<Option<Flashcard>> {
        let exists = self.get_flashcard(user_id, card_id)?.is_some();
        if !exists {
            return Ok(None);
        }
        self.write(|doc| {
            doc.flashcards
                .iter_mut()
                .find(|c| c.id == card_id && c.user_id == user_id)
                .map(|card| {
                    card.folder_id = folder_id;
                    card.clone()
                })
        })
    }

    fn delete_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<bool> {
        let exists = self.get_flashcard(user_id, card_id)?.is_some();
        if !exists {
            return Ok(false);
        }
        self.write(|doc| {
            doc.flashcards
                .retain(|c| !(c.id == card_id && c.user_id == user_id));
            true
        })
    }

    fn create_folder(&self, folder: &Folder) -> CardfoldResult<()> {
        self.write(|doc| {
            doc.ensure_user(&folder.user_id);
            doc.folders.push(folder.clone());
        })
    }

    fn get_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<Option<Folder>> {
        self.read(|doc| {
            doc.folders
                .iter()
                .find(|f| f.id == folder_id && f.user_id == user_id)
                .cloned()
        })
    }

    fn find_folder_by_name(&self, user_id: &str, name: &str) -> CardfoldResult<Option<Folder>> {
        self.read(|doc| {
            doc.folders
                .iter()
                .find(|f| f.user_id == user_id && f.name == name)
                .cloned()
        })
    }

    fn list_folders(&self, user_id: &str) -> CardfoldResult<Vec<Folder>> {
        self.read(|doc| {
            doc.folders
                .iter()
                .filter(|f| f.user_id == user_id)
                .cloned()
                .collect()
        })
    }

    fn delete_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<bool> {
        let exists = self.get_folder(user_id, folder_id)?.is_some();
        if !exists {
            return Ok(false);
        }
        self.write(|doc| {
            for card in doc
                .flashcards
                .iter_mut()
                .filter(|c| c.user_id == user_id && c.folder_id == Some(folder_id))
            {
                card.folder_id = None;
            }
            doc.folders
                .retain(|f| !(f.id == folder_id && f.user_id == user_id));
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("flashcards.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let (_dir, store) = open_temp();
        assert!(store.list_flashcards("alice").unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let (_dir, store) = open_temp();
        let cards = store
            .insert_flashcards(
                "alice",
                &[NewFlashcard::new("gato", "cat"), NewFlashcard::new("perro", "dog")],
            )
            .unwrap();
        assert_eq!(cards[0].id, 1);
        assert_eq!(cards[1].id, 2);

        let more = store
            .insert_flashcards("bob", &[NewFlashcard::new("pomme", "apple")])
            .unwrap();
        assert_eq!(more[0].id, 3);
        assert!(store.get_user("alice").unwrap().is_some());
        assert!(store.get_user("bob").unwrap().is_some());
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.json");

        let before = {
            let store = JsonFileStore::open(&path).unwrap();
            let folder = Folder::new("alice", "Food");
            store.create_folder(&folder).unwrap();
            store
                .insert_flashcards(
                    "alice",
                    &[
                        NewFlashcard::new("manzana", "apple").with_folder(folder.id),
                        NewFlashcard::new("silla", "chair"),
                    ],
                )
                .unwrap();
            store.snapshot().unwrap()
        };

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot().unwrap(), before);
        assert_eq!(reopened.list_flashcards("alice").unwrap().len(), 2);
    }

    #[test]
    fn test_scoped_by_user() {
        let (_dir, store) = open_temp();
        let cards = store
            .insert_flashcards("alice", &[NewFlashcard::new("gato", "cat")])
            .unwrap();
        let id = cards[0].id;

        assert!(store.get_flashcard("bob", id).unwrap().is_none());
        assert!(!store.delete_flashcard("bob", id).unwrap());
        assert!(store.set_flashcard_folder("bob", id, None).unwrap().is_none());
        assert!(store.get_flashcard("alice", id).unwrap().is_some());
    }

    #[test]
    fn test_delete_folder_unfiles_cards() {
        let (_dir, store) = open_temp();
        let folder = Folder::new("alice", "Animals");
        store.create_folder(&folder).unwrap();
        let cards = store
            .insert_flashcards("alice", &[NewFlashcard::new("gato", "cat").with_folder(folder.id)])
            .unwrap();

        assert!(store.delete_folder("alice", folder.id).unwrap());
        assert!(store.list_folders("alice").unwrap().is_empty());
        let card = store.get_flashcard("alice", cards[0].id).unwrap().unwrap();
        assert!(card.is_uncategorized());

        assert!(!store.delete_folder("alice", folder.id).unwrap());
    }

    #[test]
    fn test_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }
}
