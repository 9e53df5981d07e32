//! Diagnostics - Non-fatal failures seen while cleaning up an attempt.
//!
//! The unit of work reports failures it cannot return to the caller (a
//! rollback failing while another error is already being returned, a context
//! failing to close) and publication failures it does return. Reporting never
//! changes control flow.

mod buffer;
mod traced;

pub use buffer::{BufferDiagnostics, DiagnosticRecord};
pub use traced::TracingDiagnostics;

use crate::bus::PublishError;
use crate::storage::StorageError;

/// What a diagnostics record is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Rollback,
    Close,
    Publish,
    CleanupPanic,
}

/// Injected sink for diagnostics records.
pub trait Diagnostics: Send + Sync {
    /// Rolling back the attempt's transaction failed.
    fn rollback_failed(&self, error: &StorageError);

    /// Closing the attempt's context failed.
    fn close_failed(&self, error: &StorageError);

    /// Publishing the committed attempt's events failed.
    fn publish_failed(&self, error: &PublishError, events: usize);

    /// Rollback or close panicked while an earlier panic was being handled.
    /// The earlier panic is the one resumed.
    fn cleanup_panicked(&self, message: &str);
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
