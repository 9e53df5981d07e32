//! Message Bus - Post-commit domain event publishing.
//!
//! The unit of work hands every successful attempt's events to a
//! `MessageBus` as one batch.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 UnitOfWork::atomic (on success)              │
//! │  commit → collect_events() → publish_events(batch)          │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MessageBus Trait                         │
//! │  publish_events(cancel, events) - all-or-nothing per call   │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                     │
//!          ▼                  ▼                     ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────┐
//! │ InMemoryBus │    │   LogBus    │    │  LocalEmitterBus    │
//! │ (included)  │    │ (included)  │    │ (feature "emitter") │
//! └─────────────┘    └─────────────┘    └─────────────────────┘
//! ```
//!
//! Network transports (Kafka, NATS, ...) implement the same trait outside
//! this crate.

#[cfg(feature = "emitter")]
mod emitter;
mod error;
mod in_memory;
mod log_bus;
mod message_bus;

#[cfg(feature = "emitter")]
pub use emitter::LocalEmitterBus;
pub use error::PublishError;
pub use in_memory::InMemoryBus;
pub use log_bus::LogBus;
pub use message_bus::MessageBus;
