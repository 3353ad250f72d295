//! Error types for the suggestion engine

use content_store::{StoreError, UserId};
use thiserror::Error;

/// Result type for suggestion operations
pub type Result<T> = std::result::Result<T, SuggestionError>;

/// Errors that can occur while computing suggestions
#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
