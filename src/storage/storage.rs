use std::fmt;
use std::sync::Arc;

use super::StorageError;
use crate::cancel::Cancellation;

/// Lifecycle of a transaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Open,
    Committed,
    RolledBack,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Open => write!(f, "open"),
            TransactionStatus::Committed => write!(f, "committed"),
            TransactionStatus::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// A single open storage transaction.
///
/// Both operations finish the transaction; afterwards every operation on the
/// handle must fail with `StorageError::Closed`.
pub trait TransactionHandle: Send + Sync {
    /// Make the transaction's writes durable.
    fn commit(&self) -> Result<(), StorageError>;

    /// Discard the transaction's writes.
    fn rollback(&self) -> Result<(), StorageError>;
}

/// Source of new transactions.
///
/// Implementations might include:
/// - `HashMapStorage` - In-memory, for tests and single-process use
/// - A Postgres or SQLite pool handing out driver transactions
pub trait Storage: Send + Sync {
    /// The handle type returned by `begin`.
    type Transaction: TransactionHandle;

    /// Open a new transaction.
    ///
    /// Blocking implementations must return promptly once `cancel` reports
    /// cancellation.
    fn begin(&self, cancel: &Cancellation) -> Result<Self::Transaction, StorageError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    type Transaction = S::Transaction;

    fn begin(&self, cancel: &Cancellation) -> Result<Self::Transaction, StorageError> {
        (**self).begin(cancel)
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    type Transaction = S::Transaction;

    fn begin(&self, cancel: &Cancellation) -> Result<Self::Transaction, StorageError> {
        (**self).begin(cancel)
    }
}

impl<H: TransactionHandle + ?Sized> TransactionHandle for Arc<H> {
    fn commit(&self) -> Result<(), StorageError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), StorageError> {
        (**self).rollback()
    }
}
