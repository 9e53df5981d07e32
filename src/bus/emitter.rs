use std::sync::Mutex;

use event_emitter_rs::EventEmitter;

use super::{MessageBus, PublishError};
use crate::cancel::Cancellation;
use crate::event::DomainEvent;

/// A bus that emits events via an `EventEmitter` for in-process subscribers.
///
/// Listeners are keyed by event type and receive the payload as a string.
/// `EventEmitter` runs listeners on their own threads, so delivery is
/// asynchronous with respect to `publish_events`.
pub struct LocalEmitterBus {
    emitter: Mutex<EventEmitter>,
}

impl Default for LocalEmitterBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEmitterBus {
    pub fn new() -> Self {
        Self::with_emitter(EventEmitter::new())
    }

    pub fn with_emitter(emitter: EventEmitter) -> Self {
        LocalEmitterBus {
            emitter: Mutex::new(emitter),
        }
    }

    /// Register a listener for an event type.
    pub fn on<F>(&self, event_type: &str, listener: F) -> Result<(), PublishError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| PublishError::LockPoisoned("emitter subscribe"))?;
        emitter.on(event_type, listener);
        Ok(())
    }
}

impl MessageBus for LocalEmitterBus {
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError> {
        cancel.check()?;

        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| PublishError::LockPoisoned("emitter publish"))?;
        for event in events {
            // Convert bytes to string for the event emitter (assumes UTF-8)
            let payload = String::from_utf8_lossy(&event.payload).into_owned();
            emitter.emit(&event.event_type, payload);
        }
        Ok(())
    }
}
