use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::info;

use super::{MessageBus, PublishError};
use crate::cancel::Cancellation;
use crate::event::DomainEvent;

/// A bus that renders each event as one JSON line.
///
/// Lines go to a shared buffer when one is configured, otherwise to
/// `tracing` at `INFO`. UTF-8 payloads are embedded as text, anything else
/// as base64.
pub struct LogBus {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl Default for LogBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBus {
    pub fn new() -> Self {
        LogBus { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogBus {
            buffer: Some(buffer),
        }
    }

    fn render(event: &DomainEvent) -> Result<String, PublishError> {
        let (encoding, payload) = match event.payload_str() {
            Some(text) => ("utf8", text.to_string()),
            None => ("base64", STANDARD.encode(&event.payload)),
        };
        let line = json!({
            "id": event.id,
            "event_type": event.event_type,
            "encoding": encoding,
            "payload": payload,
            "metadata": event.metadata,
        });
        Ok(serde_json::to_string(&line)?)
    }
}

impl MessageBus for LogBus {
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError> {
        cancel.check()?;

        // Render everything first so a bad event leaves nothing half-written.
        let lines = events
            .iter()
            .map(Self::render)
            .collect::<Result<Vec<_>, _>>()?;

        match &self.buffer {
            Some(buffer) => {
                let mut buffer = buffer
                    .lock()
                    .map_err(|_| PublishError::LockPoisoned("log buffer"))?;
                buffer.extend(lines);
            }
            None => {
                for line in lines {
                    info!(target: "sourced_uow::bus", "{}", line);
                }
            }
        }
        Ok(())
    }
}
