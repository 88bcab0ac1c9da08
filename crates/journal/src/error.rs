use thiserror::Error;

use crate::{StreamId, Version};

/// Errors that can occur when reading from or appending to the journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The stream moved on since it was read.
    #[error(
        "Concurrency conflict for stream {stream_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        stream_id: StreamId,
        expected: Version,
        actual: Version,
    },

    /// The batch handed to `append` is malformed.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// A stored stream kind could not be recognised.
    #[error("Unknown stream kind: {0}")]
    UnknownStreamKind(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JournalError {
    /// Returns true if retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            JournalError::ConcurrencyConflict { .. } | JournalError::Database(_)
        )
    }
}

/// Result type for journal operations.
pub type Result<T> = std::result::Result<T, JournalError>;
