//! Error types for cardfold operations.
//!
//! Every fallible library call returns [`CardfoldResult`]. Variants carry an
//! [`ErrorCode`] so callers (the HTTP server in particular) can map them
//! without string matching.

use thiserror::Error;

/// Result type alias for cardfold operations.
pub type CardfoldResult<T> = Result<T, CardfoldError>;

/// Main error type for all cardfold operations.
#[derive(Error, Debug)]
pub enum CardfoldError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// A flashcard, folder or user was not found.
    #[error("Not found: {message}")]
    NotFound { message: String, code: ErrorCode },

    /// Storage operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM (translation) call failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValMissingField,
    ValInvalidId,

    // Flashcards (CARD_xxx)
    CardNotFound,

    // Folders (FOLD_xxx)
    FolderNotFound,

    // Embedding (EMB_xxx)
    EmbGenerationFailed,
    EmbDimensionMismatch,

    // LLM (LLM_xxx)
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbPoisoned,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidTimestamp,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValMissingField => "VAL_001",
            ErrorCode::ValInvalidId => "VAL_002",
            ErrorCode::CardNotFound => "CARD_001",
            ErrorCode::FolderNotFound => "FOLD_001",
            ErrorCode::EmbGenerationFailed => "EMB_001",
            ErrorCode::EmbDimensionMismatch => "EMB_002",
            ErrorCode::LlmGenerationFailed => "LLM_001",
            ErrorCode::LlmEmptyResponse => "LLM_002",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbPoisoned => "DB_003",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidTimestamp => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl CardfoldError {
    /// Create a validation error for a required form field left blank.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation {
            message: format!("{} is required", field),
            code: ErrorCode::ValMissingField,
            suggestion: Some(format!("Provide a value for '{}'", field)),
        }
    }

    /// Create a validation error for a malformed identifier.
    pub fn invalid_id(kind: &str, raw: impl AsRef<str>) -> Self {
        Self::Validation {
            message: format!("'{}' is not a valid {} id", raw.as_ref(), kind),
            code: ErrorCode::ValInvalidId,
            suggestion: None,
        }
    }

    /// Create a not found error for a flashcard.
    pub fn card_not_found(card_id: i64) -> Self {
        Self::NotFound {
            message: format!("Flashcard with id '{}' not found", card_id),
            code: ErrorCode::CardNotFound,
        }
    }

    /// Create a not found error for a folder.
    pub fn folder_not_found(folder_id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            message: format!("Folder with id '{}' not found", folder_id),
            code: ErrorCode::FolderNotFound,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create an error for a poisoned store lock.
    pub fn poisoned(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbPoisoned,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::NotFound { .. } => Some("Please check the id and ensure it exists"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::Llm { .. } => Some("Please check your translation provider configuration"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for CardfoldError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_error() {
        let err = CardfoldError::missing_field("flashcard_id");
        assert_eq!(err.code(), ErrorCode::ValMissingField);
        assert!(err.to_string().contains("flashcard_id is required"));
        assert!(err.suggestion().unwrap().contains("flashcard_id"));
    }

    #[test]
    fn test_card_not_found_error() {
        let err = CardfoldError::card_not_found(42);
        assert_eq!(err.code(), ErrorCode::CardNotFound);
        assert!(err.to_string().contains("42"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_invalid_id_error() {
        let err = CardfoldError::invalid_id("flashcard", "abc");
        assert_eq!(err.code(), ErrorCode::ValInvalidId);
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::ValMissingField.as_str(), "VAL_001");
        assert_eq!(ErrorCode::ValInvalidId.as_str(), "VAL_002");
        assert_eq!(ErrorCode::CardNotFound.as_str(), "CARD_001");
        assert_eq!(ErrorCode::DbPoisoned.as_str(), "DB_003");
    }
}
