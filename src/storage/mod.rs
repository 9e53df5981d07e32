//! Storage - Transaction sources for the unit of work.
//!
//! A `Storage` hands out one `TransactionHandle` per atomic attempt. The
//! handle is shared (via `Arc`) between the unit of work, which rolls it back
//! on failure, and the caller's `AtomicContext`, which reads and writes
//! through it and commits it on success.
//!
//! `HashMapStorage` is the in-memory backend: a single-writer key/value store
//! whose transactions stage writes until commit.

mod error;
mod in_memory;
mod storage;

pub use error::StorageError;
pub use in_memory::{HashMapStorage, HashMapTransaction};
pub use storage::{Storage, TransactionHandle, TransactionStatus};
