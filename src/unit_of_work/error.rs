use thiserror::Error;

use crate::bus::PublishError;
use crate::context::ContextError;
use crate::storage::StorageError;

/// The step of an atomic attempt an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Context,
    Logic,
    Commit,
    Publish,
}

/// Failure of one `UnitOfWork::atomic` attempt.
///
/// Every variant except `Publish` is rollback-class: the attempt's writes
/// did not become durable. `Publish` means the transaction committed but the
/// bus did not accept the events.
#[derive(Debug, Error)]
pub enum UnitOfWorkError<E> {
    #[error("state rollback: failed to begin transaction: {0}")]
    Begin(#[source] StorageError),
    #[error("state rollback: {0}")]
    Context(#[source] ContextError),
    #[error("state rollback: {0}")]
    Logic(#[source] E),
    #[error("state rollback: failed to commit transaction: {0}")]
    Commit(#[source] StorageError),
    #[error("failed to publish events: {0}")]
    Publish(#[source] PublishError),
}

impl<E> UnitOfWorkError<E> {
    /// `true` when nothing the attempt wrote became durable.
    pub fn is_rollback(&self) -> bool {
        !matches!(self, UnitOfWorkError::Publish(_))
    }

    pub fn phase(&self) -> Phase {
        match self {
            UnitOfWorkError::Begin(_) => Phase::Begin,
            UnitOfWorkError::Context(_) => Phase::Context,
            UnitOfWorkError::Logic(_) => Phase::Logic,
            UnitOfWorkError::Commit(_) => Phase::Commit,
            UnitOfWorkError::Publish(_) => Phase::Publish,
        }
    }

    /// The business error returned by the body, if that is what failed.
    pub fn logic(&self) -> Option<&E> {
        match self {
            UnitOfWorkError::Logic(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_logic(self) -> Option<E> {
        match self {
            UnitOfWorkError::Logic(err) => Some(err),
            _ => None,
        }
    }

    /// The storage error behind a `Begin` or `Commit` failure.
    pub fn storage(&self) -> Option<&StorageError> {
        match self {
            UnitOfWorkError::Begin(err) | UnitOfWorkError::Commit(err) => Some(err),
            _ => None,
        }
    }

    pub fn publish(&self) -> Option<&PublishError> {
        match self {
            UnitOfWorkError::Publish(err) => Some(err),
            _ => None,
        }
    }
}
