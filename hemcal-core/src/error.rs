//! Error types for the hemcal core.

use thiserror::Error;

use crate::classify::ApprovalState;

/// Errors that can occur in hemcal operations.
#[derive(Error, Debug)]
pub enum HemcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source fetch failed: {0}")]
    SourceFetch(String),

    #[error("Invalid event payload: {0}")]
    Validation(String),

    #[error("No event with uid '{0}'")]
    NotFound(String),

    #[error("Stale transition for '{uid}': expected {expected}, found {actual}")]
    Stale {
        uid: String,
        expected: ApprovalState,
        actual: ApprovalState,
    },

    #[error("Sync error: {0}")]
    Sync(String),

    /// The remote copy is already gone (HTTP 404/410 semantics).
    #[error("Remote event not found")]
    RemoteNotFound,

    #[error("Unusable record: {0}")]
    DataIntegrity(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for hemcal operations.
pub type HemcalResult<T> = Result<T, HemcalError>;
