//! Error types for store collaborators

use crate::types::{ContentId, UserId};
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Content not found: {0}")]
    ContentNotFound(ContentId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<String> for StoreError {
    fn from(err: String) -> Self {
        StoreError::Internal(err)
    }
}

impl From<&str> for StoreError {
    fn from(err: &str) -> Self {
        StoreError::Internal(err.to_string())
    }
}

impl StoreError {
    /// True when the error denotes a missing entity rather than an I/O fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UserNotFound(_) | StoreError::ContentNotFound(_))
    }
}
