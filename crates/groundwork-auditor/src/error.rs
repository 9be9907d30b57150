//! Error types for audit persistence

use thiserror::Error;

/// Errors that can occur while persisting or loading audit entries
#[derive(Error, Debug)]
pub enum AuditError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An entry with this query id was already finalized
    #[error("Audit entry already exists: {0}")]
    Duplicate(String),

    /// The log refused the write
    #[error("Audit log unavailable: {0}")]
    Unavailable(String),
}
