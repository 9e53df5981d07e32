use thiserror::Error;

use super::TransactionStatus;
use crate::cancel::CancelReason;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The caller's token was cancelled before a transaction could be opened.
    #[error("transaction acquisition aborted: {0}")]
    Cancelled(#[from] CancelReason),
    /// The transaction was already committed or rolled back.
    #[error("transaction already {0}")]
    Closed(TransactionStatus),
    #[error("storage lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// The backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
