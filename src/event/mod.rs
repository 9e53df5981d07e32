mod buffer;
mod domain_event;

pub use buffer::EventBuffer;
pub use domain_event::DomainEvent;
