use std::sync::Arc;

use super::PublishError;
use crate::cancel::Cancellation;
use crate::event::DomainEvent;

/// Destination for the events of a committed attempt.
///
/// Publication is all-or-nothing per call: either every event in `events`
/// is accepted or the call fails and none of them are.
///
/// Implementations might include:
/// - `InMemoryBus` - For testing and single-process scenarios
/// - `KafkaBus` - For Apache Kafka
/// - `NatsBus` - For NATS
pub trait MessageBus: Send + Sync {
    /// Publish a batch of events, oldest first.
    ///
    /// Blocking implementations should give up once `cancel` reports
    /// cancellation.
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError>;
}

impl<B: MessageBus + ?Sized> MessageBus for &B {
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError> {
        (**self).publish_events(cancel, events)
    }
}

impl<B: MessageBus + ?Sized> MessageBus for Arc<B> {
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError> {
        (**self).publish_events(cancel, events)
    }
}

impl<B: MessageBus + ?Sized> MessageBus for Box<B> {
    fn publish_events(
        &self,
        cancel: &Cancellation,
        events: Vec<DomainEvent>,
    ) -> Result<(), PublishError> {
        (**self).publish_events(cancel, events)
    }
}
