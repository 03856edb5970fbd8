//! The flashcard library: every operation the HTTP routes expose.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::categorize::Categorizer;
use crate::config::LibraryOptions;
use crate::error::{CardfoldError, CardfoldResult};
use crate::parse::parse_word_list;
use crate::store::FlashcardStore;
use crate::types::{Flashcard, Folder, LibraryOverview, MoveTarget, NewFlashcard};

/// Result of submitting a block of `word: meaning` lines.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    /// Cards that were created, in submission order.
    pub added: Vec<Flashcard>,
    /// Words skipped because the user already had them.
    pub skipped_duplicates: Vec<String>,
    /// Number of new cards filed into a folder by the categorizer.
    pub categorized: usize,
}

/// Cards for the review screen.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewDeck {
    pub flashcards: Vec<Flashcard>,
    pub current_index: usize,
}

/// Flashcards, folders and automatic categorization for every user.
pub struct Library {
    store: Arc<dyn FlashcardStore>,
    categorizer: Option<Arc<dyn Categorizer>>,
    options: LibraryOptions,
}

impl Library {
    pub fn new(
        store: Arc<dyn FlashcardStore>,
        categorizer: Option<Arc<dyn Categorizer>>,
        options: LibraryOptions,
    ) -> Self {
        Self {
            store,
            categorizer,
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn FlashcardStore> {
        &self.store
    }

    /// Name of the configured categorizer, if any.
    pub fn categorizer_name(&self) -> Option<&'static str> {
        self.categorizer.as_ref().map(|c| c.name())
    }

    /// Parse and store a submission, then file the new cards.
    pub async fn submit_words(&self, user_id: &str, text: &str) -> CardfoldResult<SubmitOutcome> {
        self.store.ensure_user(user_id)?;

        let entries = parse_word_list(text);
        let mut skipped_duplicates = Vec::new();
        let mut cards = Vec::with_capacity(entries.len());

        if self.options.dedup_words {
            let mut known: HashSet<String> = self
                .store
                .list_flashcards(user_id)?
                .into_iter()
                .map(|card| card.word)
                .collect();
            for entry in entries {
                if known.insert(entry.word.clone()) {
                    cards.push(NewFlashcard::new(entry.word, entry.meaning));
                } else {
                    skipped_duplicates.push(entry.word);
                }
            }
        } else {
            cards.extend(
                entries
                    .into_iter()
                    .map(|entry| NewFlashcard::new(entry.word, entry.meaning)),
            );
        }

        let mut added = self.store.insert_flashcards(user_id, &cards)?;

        // The cards are stored at this point; a categorizer failure leaves
        // them uncategorized instead of failing the submission.
        let categorized = if self.options.auto_categorize && !added.is_empty() {
            match self.categorize_cards(user_id, &added).await {
                Ok(filed) => {
                    for card in &mut added {
                        if let Some(folder_id) = filed.get(&card.id) {
                            card.folder_id = Some(*folder_id);
                        }
                    }
                    filed.len()
                }
                Err(e) => {
                    warn!(user_id, error = %e, "Categorization failed, new cards left uncategorized");
                    0
                }
            }
        } else {
            0
        };

        info!(
            user_id,
            added = added.len(),
            skipped = skipped_duplicates.len(),
            categorized,
            "Submitted words"
        );
        Ok(SubmitOutcome {
            added,
            skipped_duplicates,
            categorized,
        })
    }

    /// Number of cards the user owns.
    pub fn card_count(&self, user_id: &str) -> CardfoldResult<usize> {
        Ok(self.store.list_flashcards(user_id)?.len())
    }

    /// Cards to review: all of them, or only those filed in `folder_id`.
    pub fn review(&self, user_id: &str, folder_id: Option<Uuid>) -> CardfoldResult<ReviewDeck> {
        let mut flashcards = self.store.list_flashcards(user_id)?;
        if let Some(folder_id) = folder_id {
            if self.store.get_folder(user_id, folder_id)?.is_none() {
                return Err(CardfoldError::folder_not_found(folder_id));
            }
            flashcards.retain(|card| card.folder_id == Some(folder_id));
        }
        Ok(ReviewDeck {
            flashcards,
            current_index: 0,
        })
    }

    /// Folders with their cards, plus the uncategorized cards.
    pub fn overview(&self, user_id: &str) -> CardfoldResult<LibraryOverview> {
        let folders = self.store.list_folders(user_id)?;
        let cards = self.store.list_flashcards(user_id)?;
        Ok(LibraryOverview::group(folders, cards))
    }

    /// Create a folder. A blank name creates nothing.
    pub fn create_folder(&self, user_id: &str, name: &str) -> CardfoldResult<Option<Folder>> {
        let name = name.trim();
        if name.is_empty() {
            debug!(user_id, "Ignoring folder with empty name");
            return Ok(None);
        }

        self.store.ensure_user(user_id)?;
        let folder = Folder::new(user_id, name);
        self.store.create_folder(&folder)?;
        info!(user_id, folder_id = %folder.id, name, "Created folder");
        Ok(Some(folder))
    }

    /// Move a card into a folder or back to uncategorized.
    ///
    /// A target folder the user does not own leaves the card where it is.
    pub fn move_flashcard(
        &self,
        user_id: &str,
        card_id: i64,
        target: MoveTarget,
    ) -> CardfoldResult<Flashcard> {
        let card = self
            .store
            .get_flashcard(user_id, card_id)?
            .ok_or_else(|| CardfoldError::card_not_found(card_id))?;

        let folder_id = match target {
            MoveTarget::Uncategorized => None,
            MoveTarget::Folder(folder_id) => {
                if self.store.get_folder(user_id, folder_id)?.is_none() {
                    warn!(user_id, card_id, %folder_id, "Move target folder not found");
                    return Ok(card);
                }
                Some(folder_id)
            }
        };

        let moved = self
            .store
            .set_flashcard_folder(user_id, card_id, folder_id)?
            .ok_or_else(|| CardfoldError::card_not_found(card_id))?;
        debug!(user_id, card_id, folder_id = ?moved.folder_id, "Moved flashcard");
        Ok(moved)
    }

    pub fn delete_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<()> {
        if !self.store.delete_flashcard(user_id, card_id)? {
            return Err(CardfoldError::card_not_found(card_id));
        }
        info!(user_id, card_id, "Deleted flashcard");
        Ok(())
    }

    /// Delete a folder, leaving its cards uncategorized.
    ///
    /// Returns false if the user has no such folder.
    pub fn delete_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<bool> {
        let deleted = self.store.delete_folder(user_id, folder_id)?;
        if deleted {
            info!(user_id, %folder_id, "Deleted folder");
        } else {
            debug!(user_id, %folder_id, "No folder to delete");
        }
        Ok(deleted)
    }

    /// File every uncategorized card of the user. Returns how many were filed.
    ///
    /// Cards that already have a folder are left alone, so running this twice
    /// files nothing the second time.
    pub async fn categorize(&self, user_id: &str) -> CardfoldResult<usize> {
        let pending: Vec<Flashcard> = self
            .store
            .list_flashcards(user_id)?
            .into_iter()
            .filter(Flashcard::is_uncategorized)
            .collect();
        let filed = self.categorize_cards(user_id, &pending).await?;
        Ok(filed.len())
    }

    /// Label `cards` and file them, creating folders by name as needed.
    ///
    /// Returns the folder each filed card ended up in.
    async fn categorize_cards(
        &self,
        user_id: &str,
        cards: &[Flashcard],
    ) -> CardfoldResult<HashMap<i64, Uuid>> {
        let mut filed = HashMap::new();
        let Some(categorizer) = &self.categorizer else {
            return Ok(filed);
        };
        let cards: Vec<&Flashcard> = cards.iter().filter(|c| c.is_uncategorized()).collect();
        if cards.is_empty() {
            return Ok(filed);
        }

        let meanings: Vec<String> = cards.iter().map(|c| c.meaning.clone()).collect();
        let labels = categorizer.categorize_batch(&meanings).await?;

        // Folder per label for this run.
        let mut folders: HashMap<String, Uuid> = HashMap::new();

        for (card, label) in cards.into_iter().zip(labels) {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            let folder_id = match folders.get(label) {
                Some(id) => *id,
                None => {
                    let id =
                        self.folder_for_label(user_id, label, categorizer.is_batch_label(label))?;
                    folders.insert(label.to_string(), id);
                    id
                }
            };

            if self
                .store
                .set_flashcard_folder(user_id, card.id, Some(folder_id))?
                .is_some()
            {
                debug!(user_id, card_id = card.id, label, "Categorized flashcard");
                filed.insert(card.id, folder_id);
            }
        }

        info!(
            user_id,
            categorizer = categorizer.name(),
            filed = filed.len(),
            "Categorized flashcards"
        );
        Ok(filed)
    }

    /// Folder a category label files into, created if needed.
    ///
    /// A stable label reuses the oldest folder with that name. A batch label
    /// always gets a new folder, named `label`, `label (2)`, `label (3)`, ...
    /// whichever is free first.
    fn folder_for_label(
        &self,
        user_id: &str,
        label: &str,
        batch_label: bool,
    ) -> CardfoldResult<Uuid> {
        let name = if batch_label {
            let mut name = label.to_string();
            let mut n = 1;
            while self.store.find_folder_by_name(user_id, &name)?.is_some() {
                n += 1;
                name = format!("{} ({})", label, n);
            }
            name
        } else {
            if let Some(folder) = self.store.find_folder_by_name(user_id, label)? {
                return Ok(folder.id);
            }
            label.to_string()
        };

        let folder = Folder::new(user_id, name);
        self.store.create_folder(&folder)?;
        info!(user_id, folder_id = %folder.id, name = %folder.name, "Created folder for category");
        Ok(folder.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::categorize::{ClusterCategorizer, EmbeddingCategorizer, KeywordCategorizer};
    use crate::config::default_categories;
    use crate::store::SqliteStore;
    use crate::traits::Embedder;

    struct UnreachableEmbedder;

    #[async_trait]
    impl Embedder for UnreachableEmbedder {
        async fn embed(&self, _text: &str) -> CardfoldResult<Vec<f32>> {
            Err(CardfoldError::embedding("provider unreachable"))
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "unreachable"
        }
    }

    struct BrokenCategorizer;

    #[async_trait]
    impl Categorizer for BrokenCategorizer {
        async fn categorize(&self, _meaning: &str) -> CardfoldResult<String> {
            Err(CardfoldError::llm("translation backend down"))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn library_with(categorizer: Arc<dyn Categorizer>) -> Library {
        let store: Arc<dyn FlashcardStore> = Arc::new(SqliteStore::in_memory().unwrap());
        Library::new(store, Some(categorizer), LibraryOptions::default())
    }

    fn library(options: LibraryOptions) -> Library {
        let store: Arc<dyn FlashcardStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let categorizer: Arc<dyn Categorizer> =
            Arc::new(KeywordCategorizer::new(&default_categories(), "Uncategorized"));
        Library::new(store, Some(categorizer), options)
    }

    fn manual() -> LibraryOptions {
        LibraryOptions {
            dedup_words: true,
            auto_categorize: false,
        }
    }

    #[tokio::test]
    async fn test_submit_skips_duplicates() {
        let library = library(manual());
        let outcome = library
            .submit_words("alice", "perro: dog\ngato: cat\nperro: hound")
            .await
            .unwrap();
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.skipped_duplicates, vec!["perro"]);

        let outcome = library.submit_words("alice", "gato: cat").await.unwrap();
        assert!(outcome.added.is_empty());
        assert_eq!(library.card_count("alice").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_submit_without_dedup_keeps_repeats() {
        let library = library(LibraryOptions {
            dedup_words: false,
            auto_categorize: false,
        });
        let outcome = library.submit_words("alice", "a: x\na: y").await.unwrap();
        assert_eq!(outcome.added.len(), 2);
        assert!(outcome.skipped_duplicates.is_empty());
    }

    #[tokio::test]
    async fn test_submit_auto_categorizes_new_cards() {
        let library = library(LibraryOptions::default());
        let outcome = library
            .submit_words("alice", "perro: a loyal dog\nmanzana: a fruit")
            .await
            .unwrap();
        assert_eq!(outcome.categorized, 2);
        assert!(outcome.added.iter().all(|c| c.folder_id.is_some()));

        let overview = library.overview("alice").unwrap();
        let names: Vec<&str> = overview.folders.iter().map(|g| g.folder.name.as_str()).collect();
        assert_eq!(names, vec!["Animals", "Food"]);
    }

    #[tokio::test]
    async fn test_categorize_is_idempotent() {
        let library = library(manual());
        library
            .submit_words("alice", "perro: dog\nsilla: furniture\nalegria: joy")
            .await
            .unwrap();

        assert_eq!(library.categorize("alice").await.unwrap(), 3);
        let before = library.overview("alice").unwrap();

        assert_eq!(library.categorize("alice").await.unwrap(), 0);
        let after = library.overview("alice").unwrap();
        assert_eq!(before.folders.len(), after.folders.len());
        assert!(after.uncategorized.is_empty());
    }

    #[tokio::test]
    async fn test_move_and_delete() {
        let library = library(manual());
        let outcome = library.submit_words("alice", "perro: dog").await.unwrap();
        let card_id = outcome.added[0].id;
        let folder = library.create_folder("alice", "  Pets ").unwrap().unwrap();
        assert_eq!(folder.name, "Pets");

        let moved = library
            .move_flashcard("alice", card_id, MoveTarget::Folder(folder.id))
            .unwrap();
        assert_eq!(moved.folder_id, Some(folder.id));

        // Unknown target leaves the card where it is.
        let unchanged = library
            .move_flashcard("alice", card_id, MoveTarget::Folder(Uuid::new_v4()))
            .unwrap();
        assert_eq!(unchanged.folder_id, Some(folder.id));

        assert!(library.delete_folder("alice", folder.id).unwrap());
        let card = library.store().get_flashcard("alice", card_id).unwrap().unwrap();
        assert!(card.is_uncategorized());

        library.delete_flashcard("alice", card_id).unwrap();
        let err = library.delete_flashcard("alice", card_id).unwrap_err();
        assert!(matches!(err, CardfoldError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let library = library(manual());
        let outcome = library.submit_words("alice", "perro: dog").await.unwrap();
        let card_id = outcome.added[0].id;

        assert_eq!(library.card_count("bob").unwrap(), 0);
        let err = library
            .move_flashcard("bob", card_id, MoveTarget::Uncategorized)
            .unwrap_err();
        assert!(matches!(err, CardfoldError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_review_by_folder() {
        let library = library(manual());
        library.submit_words("alice", "perro: dog\ngato: cat").await.unwrap();
        let folder = library.create_folder("alice", "Pets").unwrap().unwrap();
        let first = library.review("alice", None).unwrap();
        assert_eq!(first.flashcards.len(), 2);
        assert_eq!(first.current_index, 0);

        library
            .move_flashcard("alice", first.flashcards[1].id, MoveTarget::Folder(folder.id))
            .unwrap();
        let deck = library.review("alice", Some(folder.id)).unwrap();
        assert_eq!(deck.flashcards.len(), 1);
        assert_eq!(deck.flashcards[0].word, "gato");

        assert!(library.review("alice", Some(Uuid::new_v4())).is_err());
        assert!(library.create_folder("alice", "   ").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_embedder_files_into_fallback() {
        let categorizer = Arc::new(EmbeddingCategorizer::new(
            Arc::new(UnreachableEmbedder),
            default_categories(),
            "Uncategorized",
        ));
        let library = library_with(categorizer);

        let outcome = library.submit_words("alice", "perro: dog").await.unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.categorized, 1);

        let overview = library.overview("alice").unwrap();
        assert_eq!(overview.folders.len(), 1);
        assert_eq!(overview.folders[0].folder.name, "Uncategorized");
        assert_eq!(overview.card_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_categorizer_keeps_submission() {
        let library = library_with(Arc::new(BrokenCategorizer));

        let outcome = library
            .submit_words("alice", "perro: dog
gato: cat")
            .await
            .unwrap();
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.categorized, 0);
        assert!(outcome.added.iter().all(Flashcard::is_uncategorized));

        let overview = library.overview("alice").unwrap();
        assert!(overview.folders.is_empty());
        assert_eq!(overview.uncategorized.len(), 2);

        // An explicit run still reports the failure.
        assert!(library.categorize("alice").await.is_err());
    }

    #[tokio::test]
    async fn test_cluster_batches_get_their_own_folders() {
        let library = library_with(Arc::new(ClusterCategorizer::new(1, "Uncategorized")));

        let first = library.submit_words("alice", "perro: loyal dog").await.unwrap();
        let second = library.submit_words("alice", "manzana: red fruit").await.unwrap();
        assert_ne!(first.added[0].folder_id, second.added[0].folder_id);

        let overview = library.overview("alice").unwrap();
        let names: Vec<&str> = overview.folders.iter().map(|g| g.folder.name.as_str()).collect();
        assert_eq!(names, vec!["Cluster 1", "Cluster 1 (2)"]);
        assert!(overview.folders.iter().all(|g| g.flashcards.len() == 1));

        // The fallback label is stable across batches.
        library.submit_words("alice", "x: the").await.unwrap();
        library.submit_words("alice", "y: of").await.unwrap();
        let overview = library.overview("alice").unwrap();
        let fallback = overview
            .folders
            .iter()
            .find(|g| g.folder.name == "Uncategorized")
            .unwrap();
        assert_eq!(fallback.flashcards.len(), 2);
        assert_eq!(overview.folders.len(), 3);
    }
}
