mod atomic_context;
mod error;

pub use atomic_context::AtomicContext;
pub use error::ContextError;
