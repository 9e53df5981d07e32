use tracing::error;

use super::Diagnostics;
use crate::bus::PublishError;
use crate::storage::StorageError;

/// Default diagnostics: structured `tracing` records at `ERROR`.
///
/// Installs no subscriber; records go wherever the application routes them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn rollback_failed(&self, err: &StorageError) {
        error!(error = %err, "failed to rollback transaction");
    }

    fn close_failed(&self, err: &StorageError) {
        error!(error = %err, "failed to close atomic context");
    }

    fn publish_failed(&self, err: &PublishError, events: usize) {
        error!(error = %err, events, "failed to publish events");
    }

    fn cleanup_panicked(&self, message: &str) {
        error!(panic = message, "cleanup panicked while rolling back");
    }
}
