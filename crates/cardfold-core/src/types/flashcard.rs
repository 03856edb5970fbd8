//! Flashcard records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A word/meaning pair owned by a user, optionally filed in a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Store-assigned id, increasing in insertion order.
    pub id: i64,
    /// Owning user.
    pub user_id: String,
    /// Front of the card.
    pub word: String,
    /// Back of the card.
    pub meaning: String,
    /// Folder the card is filed in; `None` means uncategorized.
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    /// Whether the card is not filed in any folder.
    pub fn is_uncategorized(&self) -> bool {
        self.folder_id.is_none()
    }
}

/// A flashcard that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlashcard {
    pub word: String,
    pub meaning: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

impl NewFlashcard {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
            folder_id: None,
        }
    }

    /// File the new card directly into a folder.
    pub fn with_folder(mut self, folder_id: Uuid) -> Self {
        self.folder_id = Some(folder_id);
        self
    }
}

/// Destination of a move operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Clear the card's folder.
    Uncategorized,
    /// File the card into the given folder.
    Folder(Uuid),
}

impl MoveTarget {
    /// Form value that selects [`MoveTarget::Uncategorized`].
    pub const UNCATEGORIZED: &'static str = "uncategorized";

    /// Parse a `to_folder` form value.
    ///
    /// Returns `None` when the value is neither `uncategorized` nor a UUID.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == Self::UNCATEGORIZED {
            return Some(Self::Uncategorized);
        }
        Uuid::parse_str(raw).ok().map(Self::Folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_target_parse() {
        assert_eq!(
            MoveTarget::parse("uncategorized"),
            Some(MoveTarget::Uncategorized)
        );

        let id = Uuid::new_v4();
        assert_eq!(
            MoveTarget::parse(&format!(" {} ", id)),
            Some(MoveTarget::Folder(id))
        );

        assert_eq!(MoveTarget::parse("Food"), None);
        assert_eq!(MoveTarget::parse(""), None);
    }

    #[test]
    fn test_new_flashcard_with_folder() {
        let id = Uuid::new_v4();
        let card = NewFlashcard::new("gato", "cat").with_folder(id);
        assert_eq!(card.word, "gato");
        assert_eq!(card.folder_id, Some(id));
    }
}
