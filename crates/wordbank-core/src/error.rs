//! Error taxonomy for the word bank.

use crate::media::MediaError;

/// Word bank errors.
///
/// Storage-time failures (I/O, document shape, persistence) surface here.
/// Matching-time failures such as an invalid regex trigger never do; those
/// are logged and skipped by the matcher.
#[derive(Debug, thiserror::Error)]
pub enum WordBankError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bank document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("failed to persist bank to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("unknown match strategy: {0}")]
    InvalidStrategy(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("moderation failed: {0}")]
    Moderation(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for word bank operations.
pub type Result<T> = std::result::Result<T, WordBankError>;
