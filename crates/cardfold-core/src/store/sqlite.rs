//! SQLite backend.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::FlashcardStore;
use crate::error::{CardfoldError, CardfoldResult, ErrorCode};
use crate::types::{Flashcard, Folder, NewFlashcard, User};

const FLASHCARD_COLUMNS: &str = "id, user_id, word, meaning, folder_id, created_at";
const FOLDER_COLUMNS: &str = "id, user_id, name, created_at";
const USER_COLUMNS: &str =
    "id, email, first_name, last_name, profile_image_url, created_at, updated_at";

/// SQLite-backed flashcard store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new store at the given path
    pub fn new(path: impl AsRef<Path>) -> CardfoldResult<Self> {
        let conn = Connection::open(path).map_err(|e| CardfoldError::Database {
            message: e.to_string(),
            code: ErrorCode::DbConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> CardfoldResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> CardfoldResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CardfoldError::poisoned(e.to_string()))
    }

    fn init_schema(&self) -> CardfoldResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE,
                first_name TEXT,
                last_name TEXT,
                profile_image_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS folders (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_folders_user
                ON folders(user_id, created_at);

            CREATE TABLE IF NOT EXISTS flashcards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL,
                meaning TEXT NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                folder_id TEXT REFERENCES folders(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_flashcards_user_folder
                ON flashcards(user_id, folder_id);
        "#,
        )?;
        Ok(())
    }

    fn parse_time(raw: &str) -> CardfoldResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CardfoldError::Parse {
                message: format!("invalid timestamp '{}': {}", raw, e),
                code: ErrorCode::ParseInvalidTimestamp,
            })
    }

    fn parse_uuid(raw: &str) -> CardfoldResult<Uuid> {
        Uuid::parse_str(raw).map_err(|e| CardfoldError::parse(e.to_string()))
    }

    fn row_to_flashcard(row: &rusqlite::Row<'_>) -> CardfoldResult<Flashcard> {
        let folder_id: Option<String> = row.get(4)?;
        let created_at: String = row.get(5)?;

        Ok(Flashcard {
            id: row.get(0)?,
            user_id: row.get(1)?,
            word: row.get(2)?,
            meaning: row.get(3)?,
            folder_id: folder_id.as_deref().map(Self::parse_uuid).transpose()?,
            created_at: Self::parse_time(&created_at)?,
        })
    }

    fn row_to_folder(row: &rusqlite::Row<'_>) -> CardfoldResult<Folder> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(3)?;

        Ok(Folder {
            id: Self::parse_uuid(&id)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            created_at: Self::parse_time(&created_at)?,
        })
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> CardfoldResult<User> {
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            profile_image_url: row.get(4)?,
            created_at: Self::parse_time(&created_at)?,
            updated_at: Self::parse_time(&updated_at)?,
        })
    }

    fn insert_user_if_missing(conn: &Connection, user_id: &str) -> CardfoldResult<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR IGNORE INTO users (id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![user_id, now],
        )?;
        Ok(())
    }

    fn query_user(conn: &Connection, user_id: &str) -> CardfoldResult<Option<User>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            USER_COLUMNS
        ))?;
        stmt.query_row(params![user_id], |row| Ok(Self::row_to_user(row)))
            .optional()?
            .transpose()
    }

    fn query_flashcard(
        conn: &Connection,
        user_id: &str,
        card_id: i64,
    ) -> CardfoldResult<Option<Flashcard>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM flashcards WHERE id = ?1 AND user_id = ?2",
            FLASHCARD_COLUMNS
        ))?;
        stmt.query_row(params![card_id, user_id], |row| {
            Ok(Self::row_to_flashcard(row))
        })
        .optional()?
        .transpose()
    }
}

impl FlashcardStore for SqliteStore {
    fn ensure_user(&self, user_id: &str) -> CardfoldResult<User> {
        let conn = self.lock()?;
        Self::insert_user_if_missing(&conn, user_id)?;
        Self::query_user(&conn, user_id)?
            .ok_or_else(|| CardfoldError::Internal(format!("user '{}' vanished after insert", user_id)))
    }

    fn get_user(&self, user_id: &str) -> CardfoldResult<Option<User>> {
        let conn = self.lock()?;
        Self::query_user(&conn, user_id)
    }

    fn insert_flashcards(
        &self,
        user_id: &str,
        cards: &[NewFlashcard],
    ) -> CardfoldResult<Vec<Flashcard>> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::insert_user_if_missing(&tx, user_id)?;

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(cards.len());
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO flashcards (word, meaning, user_id, folder_id, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for card in cards {
                stmt.execute(params![
                    card.word,
                    card.meaning,
                    user_id,
                    card.folder_id.map(|id| id.to_string()),
                    now.to_rfc3339(),
                ])?;
                inserted.push(Flashcard {
                    id: tx.last_insert_rowid(),
                    user_id: user_id.to_string(),
                    word: card.word.clone(),
                    meaning: card.meaning.clone(),
                    folder_id: card.folder_id,
                    created_at: now,
                });
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn get_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<Option<Flashcard>> {
        let conn = self.lock()?;
        Self::query_flashcard(&conn, user_id, card_id)
    }

    fn list_flashcards(&self, user_id: &str) -> CardfoldResult<Vec<Flashcard>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM flashcards WHERE user_id = ?1 ORDER BY id ASC",
            FLASHCARD_COLUMNS
        ))?;
        let results = stmt.query_map(params![user_id], |row| Ok(Self::row_to_flashcard(row)))?;

        results
            .map(|r| r.map_err(|e| e.into()).and_then(|inner| inner))
            .collect()
    }

    fn set_flashcard_folder(
        &self,
        user_id: &str,
        card_id: i64,
        folder_id: Option<Uuid>,
    ) -> CardfoldResult<Option<Flashcard>> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE flashcards SET folder_id = ?1 WHERE id = ?2 AND user_id = ?3",
            params![folder_id.map(|id| id.to_string()), card_id, user_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Self::query_flashcard(&conn, user_id, card_id)
    }

    fn delete_flashcard(&self, user_id: &str, card_id: i64) -> CardfoldResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM flashcards WHERE id = ?1 AND user_id = ?2",
            params![card_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn create_folder(&self, folder: &Folder) -> CardfoldResult<()> {
        let conn = self.lock()?;
        Self::insert_user_if_missing(&conn, &folder.user_id)?;
        conn.execute(
            "INSERT INTO folders (id, name, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                folder.id.to_string(),
                folder.name,
                folder.user_id,
                folder.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<Option<Folder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM folders WHERE id = ?1 AND user_id = ?2",
            FOLDER_COLUMNS
        ))?;
        stmt.query_row(params![folder_id.to_string(), user_id], |row| {
            Ok(Self::row_to_folder(row))
        })
        .optional()?
        .transpose()
    }

    fn find_folder_by_name(&self, user_id: &str, name: &str) -> CardfoldResult<Option<Folder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM folders WHERE user_id = ?1 AND name = ?2
             ORDER BY rowid ASC LIMIT 1",
            FOLDER_COLUMNS
        ))?;
        stmt.query_row(params![user_id, name], |row| Ok(Self::row_to_folder(row)))
            .optional()?
            .transpose()
    }

    fn list_folders(&self, user_id: &str) -> CardfoldResult<Vec<Folder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM folders WHERE user_id = ?1 ORDER BY rowid ASC",
            FOLDER_COLUMNS
        ))?;
        let results = stmt.query_map(params![user_id], |row| Ok(Self::row_to_folder(row)))?;

        results
            .map(|r| r.map_err(|e| e.into()).and_then(|inner| inner))
            .collect()
    }

    fn delete_folder(&self, user_id: &str, folder_id: Uuid) -> CardfoldResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = folder_id.to_string();

        tx.execute(
            "UPDATE flashcards SET folder_id = NULL WHERE folder_id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM folders WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        tx.commit()?;
        Ok(deleted > 0)
    }
}
