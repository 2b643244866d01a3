//! Error types for fingerprint authentication

use thiserror::Error;

/// Result type alias for fpauth operations
pub type Result<T> = std::result::Result<T, FpAuthError>;

/// Errors that can occur outside the callback contract
///
/// Nothing here is ever delivered to an authenticate() caller directly. The session
/// folds these into wire error codes at its boundary.
#[derive(Debug, Error)]
pub enum FpAuthError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential material could not be created or used
    #[error("Credential error: {0}")]
    Credential(String),

    /// Prompt executor is unavailable
    #[error("Executor error: {0}")]
    Executor(String),
}

impl From<serde_json::Error> for FpAuthError {
    fn from(e: serde_json::Error) -> Self {
        FpAuthError::Serialization(e.to_string())
    }
}
