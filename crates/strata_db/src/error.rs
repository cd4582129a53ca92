//! Error types for the database layer.

use thiserror::Error;

/// Database operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Database errors.
///
/// Coordinated mutations never wrap these: a failure inside a transaction
/// rolls the transaction back and the causing error propagates unchanged.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation surfaced from the store (e.g. two creates racing
    /// on the same (site, handle))
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A physical table was expected to exist but does not
    #[error("Table not found: {0}")]
    TableMissing(String),

    /// A handle failed strict identifier validation before reaching DDL
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a table-missing error.
    pub fn table_missing(table: impl Into<String>) -> Self {
        Self::TableMissing(table.into())
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Classify a write failure, turning store uniqueness violations into
/// [`DbError::Conflict`] so racing callers see a conflict rather than a
/// raw driver error. Everything else passes through as [`DbError::Sqlx`].
pub fn classify_write_error(err: sqlx::Error, what: &str) -> DbError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            DbError::Conflict(format!("{what}: {}", db.message()))
        }
        _ => DbError::Sqlx(err),
    }
}
