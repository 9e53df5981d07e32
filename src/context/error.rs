use thiserror::Error;

use crate::storage::StorageError;

/// Failure to adapt a raw transaction handle into a typed `AtomicContext`.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("context construction failed: {0}")]
    Storage(#[from] StorageError),
    #[error("context construction failed: {0}")]
    Invalid(String),
    #[error("context construction failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ContextError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ContextError::Invalid(message.into())
    }
}
