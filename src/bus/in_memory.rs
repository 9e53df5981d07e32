//! In-memory message bus for testing and single-process scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::{MessageBus, PublishError};
use crate::cancel::Cancellation;
use crate::event::DomainEvent;

/// In-memory message bus.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - Events are stored in an append-only log
/// - Each batch is appended under a single write lock
/// - Cancelled tokens are refused before anything is appended
///
/// ## Example
///
/// ```
/// use sourced_uow::bus::{InMemoryBus, MessageBus};
/// use sourced_uow::cancel::Cancellation;
/// use sourced_uow::event::DomainEvent;
///
/// let bus = InMemoryBus::new();
/// bus.publish_events(
///     &Cancellation::new(),
///     vec![DomainEvent::with_string_payload("evt-1", "OrderCreated", "{}")],
/// )
/// .unwrap();
///
/// assert_eq!(bus.event_types(), vec!["OrderCreated"]);
/// assert_eq!(bus.batches(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBus {
    /// Shared event log
    log: Arc<RwLock<Vec<DomainEvent>>>,
    /// Number of accepted `publish_events` calls
    batches: Arc<AtomicUsize>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all events in the log.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.read_log().clone()
    }

    /// Get all event types in order.
    pub fn event_types(&self) -> Vec<String> {
        self.read_log()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Number of batches accepted so far, including empty ones.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Get the total number of events in the log.
    pub fn len(&self) -> usize {
        self.read_log().len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.read_log().is_empty()
    }

    /// Find the first event of a type.
    pub fn find_by_type(&self, event_type: &str) -> Option<DomainEvent> {
        self.read_log()
            .iter()
            .find(|e| e.event_type == event_type)
            .cloned()
    }

    /// Clear the log and batch counter.
    pub fn clear(&self) {
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.batches.store(0, Ordering::SeqCst);
    }

    fn read_log(&self) -> std::sync::RwLockReadGuard<'_, Vec<DomainEvent>> {
        self.log.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageBus for InMemoryBus {
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError> {
        cancel.check()?;

        let mut log = self
            .log
            .write()
            .map_err(|_| PublishError::LockPoisoned("publish"))?;
        log.extend(events);
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
