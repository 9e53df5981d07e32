//! Cancellation - Explicit cancellation and deadline tokens.
//!
//! Every blocking operation in the crate (`Storage::begin`, the unit of work
//! body, `MessageBus::publish_events`) receives a `&Cancellation`. Tokens form
//! a tree: cancelling a parent cancels every live child, while cancelling a
//! child leaves its parent untouched.
//!
//! ```text
//! caller token ──child()──▶ attempt token (cancelled when the attempt ends)
//! ```

mod cancellation;
mod guard;

pub use cancellation::{CancelReason, Cancellation};
pub use guard::CancelGuard;
