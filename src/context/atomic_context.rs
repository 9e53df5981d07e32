use crate::event::DomainEvent;
use crate::storage::StorageError;

/// The typed execution surface business logic runs against during one
/// atomic attempt.
///
/// Implementations wrap a transaction handle (usually together with the
/// repositories that read and write through it) and an `EventBuffer` the
/// business logic records domain events into.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use sourced_uow::context::AtomicContext;
/// use sourced_uow::event::{DomainEvent, EventBuffer};
/// use sourced_uow::storage::{HashMapTransaction, StorageError, TransactionHandle};
///
/// struct AccountsContext {
///     tx: Arc<HashMapTransaction>,
///     events: EventBuffer,
/// }
///
/// impl AtomicContext for AccountsContext {
///     fn commit(&mut self) -> Result<(), StorageError> {
///         self.tx.commit()
///     }
///
///     fn close(&mut self) -> Result<(), StorageError> {
///         Ok(())
///     }
///
///     fn collect_events(&mut self) -> Vec<DomainEvent> {
///         self.events.drain()
///     }
/// }
/// ```
pub trait AtomicContext {
    /// Finalize the underlying transaction.
    fn commit(&mut self) -> Result<(), StorageError>;

    /// Release resources tied to the transaction. Called once per attempt,
    /// after commit or rollback.
    fn close(&mut self) -> Result<(), StorageError>;

    /// Drain the events recorded so far, oldest first.
    ///
    /// Must leave the context empty: a second call returns no events.
    fn collect_events(&mut self) -> Vec<DomainEvent>;
}
