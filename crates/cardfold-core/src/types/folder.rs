//! Folder records and the grouped views built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Flashcard;

/// A named grouping of flashcards owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Create a folder with a fresh id.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A folder together with the cards filed in it, in id order.
#[derive(Debug, Clone, Serialize)]
pub struct FolderWithCards {
    #[serde(flatten)]
    pub folder: Folder,
    pub flashcards: Vec<Flashcard>,
}

/// Everything a user owns, grouped by folder.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryOverview {
    pub folders: Vec<FolderWithCards>,
    pub uncategorized: Vec<Flashcard>,
}

impl LibraryOverview {
    /// Group cards under their folders.
    ///
    /// Cards pointing at a folder missing from `folders` are reported as
    /// uncategorized.
    pub fn group(folders: Vec<Folder>, cards: Vec<Flashcard>) -> Self {
        let mut grouped: Vec<FolderWithCards> = folders
            .into_iter()
            .map(|folder| FolderWithCards {
                folder,
                flashcards: Vec::new(),
            })
            .collect();
        let mut uncategorized = Vec::new();

        for card in cards {
            let slot = card
                .folder_id
                .and_then(|id| grouped.iter().position(|g| g.folder.id == id));
            match slot {
                Some(index) => grouped[index].flashcards.push(card),
                None => uncategorized.push(card),
            }
        }

        for group in &mut grouped {
            group.flashcards.sort_by_key(|c| c.id);
        }
        uncategorized.sort_by_key(|c| c.id);

        Self {
            folders: grouped,
            uncategorized,
        }
    }

    /// Total number of cards across folders and the uncategorized list.
    pub fn card_count(&self) -> usize {
        self.uncategorized.len()
            + self
                .folders
                .iter()
                .map(|g| g.flashcards.len())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64, folder_id: Option<Uuid>) -> Flashcard {
        Flashcard {
            id,
            user_id: "u".to_string(),
            word: format!("w{}", id),
            meaning: format!("m{}", id),
            folder_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_folder() {
        let food = Folder::new("u", "Food");
        let animals = Folder::new("u", "Animals");
        let orphan = Uuid::new_v4();

        let overview = LibraryOverview::group(
            vec![food.clone(), animals.clone()],
            vec![
                card(3, Some(food.id)),
                card(1, Some(food.id)),
                card(2, None),
                card(4, Some(orphan)),
            ],
        );

        assert_eq!(overview.folders.len(), 2);
        let food_ids: Vec<i64> = overview.folders[0].flashcards.iter().map(|c| c.id).collect();
        assert_eq!(food_ids, vec![1, 3]);
        assert!(overview.folders[1].flashcards.is_empty());

        let loose: Vec<i64> = overview.uncategorized.iter().map(|c| c.id).collect();
        assert_eq!(loose, vec![2, 4]);
        assert_eq!(overview.card_count(), 4);
    }
}
