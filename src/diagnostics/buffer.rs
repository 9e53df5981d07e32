use std::sync::{Arc, Mutex, PoisonError};

use super::{Diagnostics, DiagnosticKind};
use crate::bus::PublishError;
use crate::storage::StorageError;

/// A captured diagnostics record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Diagnostics that keep every record in a shared buffer.
///
/// Cloning shares the buffer, so a test can keep one handle and give the
/// other to the unit of work.
#[derive(Debug, Default, Clone)]
pub struct BufferDiagnostics {
    records: Arc<Mutex<Vec<DiagnosticRecord>>>,
}

impl BufferDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.lock().clone()
    }

    /// Records of one kind, oldest first.
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<DiagnosticRecord> {
        self.lock()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, kind: DiagnosticKind, message: String) {
        self.lock().push(DiagnosticRecord { kind, message });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DiagnosticRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Diagnostics for BufferDiagnostics {
    fn rollback_failed(&self, error: &StorageError) {
        self.push(DiagnosticKind::Rollback, error.to_string());
    }

    fn close_failed(&self, error: &StorageError) {
        self.push(DiagnosticKind::Close, error.to_string());
    }

    fn publish_failed(&self, error: &PublishError, events: usize) {
        self.push(
            DiagnosticKind::Publish,
            format!("{} ({} events)", error, events),
        );
    }

    fn cleanup_panicked(&self, message: &str) {
        self.push(DiagnosticKind::CleanupPanic, message.to_string());
    }
}
