//! Error types for the ContentGateway

use thiserror::Error;

/// Errors that can occur in the ContentGateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ContentGateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
