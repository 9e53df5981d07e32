//! Unit of work for Plain Old Rust Structs.
//!
//! `UnitOfWork::atomic` wraps business logic in one storage transaction:
//! errors and panics roll it back, success commits it and publishes the
//! domain events the logic recorded to a `MessageBus`.
//!
//! Storage, context and bus are pluggable traits; in-memory implementations
//! (`HashMapStorage`, `InMemoryBus`) are included for tests and
//! single-process use.

pub mod bus;
pub mod cancel;
pub mod context;
pub mod diagnostics;
pub mod event;
pub mod storage;
mod unit_of_work;

pub use bus::{InMemoryBus, LogBus, MessageBus, PublishError};
pub use cancel::{CancelGuard, CancelReason, Cancellation};
pub use context::{AtomicContext, ContextError};
pub use diagnostics::{BufferDiagnostics, Diagnostics, TracingDiagnostics};
pub use event::{DomainEvent, EventBuffer};
pub use storage::{
    HashMapStorage, HashMapTransaction, Storage, StorageError, TransactionHandle,
    TransactionStatus,
};
pub use unit_of_work::{Phase, UnitOfWork, UnitOfWorkError};

#[cfg(feature = "emitter")]
pub use bus::LocalEmitterBus;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
