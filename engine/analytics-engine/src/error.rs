//! Error types for the analytics engine

use content_store::StoreError;
use thiserror::Error;

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while computing analytics
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A structurally unusable query parameter. Malformed `period` values
    /// are NOT this — they default permissively to daily.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Collaborator-level I/O failure, surfaced unchanged. Retry policy
    /// belongs to the caller.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
