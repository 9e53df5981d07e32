use std::error::Error as StdError;

use thiserror::Error;

use crate::cancel::CancelReason;

/// Error type for publish operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Connection to the bus failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Serialization of an event failed
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// The bus rejected the batch
    #[error("events rejected: {0}")]
    Rejected(String),
    /// Timeout waiting for acknowledgment
    #[error("publish timeout")]
    Timeout,
    /// The caller's token was cancelled before the batch was accepted
    #[error("publish cancelled: {0}")]
    Cancelled(#[from] CancelReason),
    #[error("message bus lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// Other error
    #[error("publish error: {0}")]
    Other(#[source] Box<dyn StdError + Send + Sync>),
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::SerializationFailed(err.to_string())
    }
}
