use super::DomainEvent;

/// Ordered accumulator for the events one atomic attempt produces.
///
/// `AtomicContext` implementations embed one and hand it to their
/// repositories; `drain()` empties it, so collecting twice never publishes
/// the same event twice.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<DomainEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Insertion order is publication order.
    pub fn record(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Recorded events, oldest first, without draining.
    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Take every recorded event, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Extend<DomainEvent> for EventBuffer {
    fn extend<I: IntoIterator<Item = DomainEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
