use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::debug;

use super::UnitOfWorkError;
use crate::bus::MessageBus;
use crate::cancel::Cancellation;
use crate::context::{AtomicContext, ContextError};
use crate::diagnostics::{panic_message, Diagnostics, TracingDiagnostics};
use crate::storage::{Storage, TransactionHandle};

/// Runs business logic inside a single storage transaction and publishes
/// the events it records once the transaction has committed.
///
/// Generic over:
/// - `S` - the storage backend handing out transactions
/// - `F` - the factory adapting a transaction into the caller's context
/// - `B` - the message bus receiving events of committed attempts
/// - `T` - the caller's `AtomicContext`
///
/// The unit of work holds no locks and spawns no threads; it is safe to share
/// across threads whenever its collaborators are.
pub struct UnitOfWork<S, F, B, T> {
    storage: S,
    new_context: F,
    bus: B,
    diagnostics: Arc<dyn Diagnostics>,
    _context: PhantomData<fn() -> T>,
}

impl<S, F, B, T> UnitOfWork<S, F, B, T>
where
    S: Storage,
    F: Fn(Arc<S::Transaction>) -> Result<T, ContextError>,
    B: MessageBus,
    T: AtomicContext,
{
    /// Create a unit of work reporting diagnostics through `tracing`.
    pub fn new(storage: S, new_context: F, bus: B) -> Self {
        UnitOfWork {
            storage,
            new_context,
            bus,
            diagnostics: Arc::new(TracingDiagnostics),
            _context: PhantomData,
        }
    }

    /// Replace the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Run `body` as one atomic attempt.
    ///
    /// The body receives a child of `cancel` (cancelled as soon as the
    /// attempt ends, however it ends) and the typed context.
    ///
    /// - Body error: the transaction is rolled back and the error returned
    ///   as `UnitOfWorkError::Logic`. No events are published.
    /// - Body panic: the transaction is rolled back and the panic resumed
    ///   with its original payload. A panic raised by rollback or close at
    ///   that point goes to the diagnostics sink instead.
    /// - Body success: the context commits, its events are drained and
    ///   published as one batch. A publish failure is returned as
    ///   `UnitOfWorkError::Publish`; the data is already durable.
    ///
    /// Rollback and close failures during cleanup go to the diagnostics sink
    /// and never replace the error being returned.
    pub fn atomic<E, Body>(
        &self,
        cancel: &Cancellation,
        body: Body,
    ) -> Result<(), UnitOfWorkError<E>>
    where
        Body: FnOnce(&Cancellation, &mut T) -> Result<(), E>,
    {
        let tx = Arc::new(self.storage.begin(cancel).map_err(UnitOfWorkError::Begin)?);
        let mut ctx = (self.new_context)(Arc::clone(&tx)).map_err(UnitOfWorkError::Context)?;

        let attempt = cancel.child();
        let _attempt_guard = attempt.cancel_on_drop();

        match panic::catch_unwind(AssertUnwindSafe(|| body(&attempt, &mut ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.abort(&tx, &mut ctx);
                debug!("atomic attempt rolled back");
                return Err(UnitOfWorkError::Logic(err));
            }
            Err(payload) => {
                let cleanup =
                    panic::catch_unwind(AssertUnwindSafe(|| self.abort(&tx, &mut ctx)));
                if let Err(cleanup_payload) = cleanup {
                    self.diagnostics
                        .cleanup_panicked(&panic_message(&*cleanup_payload));
                }
                panic::resume_unwind(payload);
            }
        }

        if let Err(err) = ctx.commit() {
            self.abort(&tx, &mut ctx);
            return Err(UnitOfWorkError::Commit(err));
        }

        let events = ctx.collect_events();
        self.close(&mut ctx);

        let count = events.len();
        if let Err(err) = self.bus.publish_events(cancel, events) {
            self.diagnostics.publish_failed(&err, count);
            return Err(UnitOfWorkError::Publish(err));
        }

        debug!(events = count, "atomic attempt committed");
        Ok(())
    }

    fn abort(&self, tx: &S::Transaction, ctx: &mut T) {
        if let Err(err) = tx.rollback() {
            self.diagnostics.rollback_failed(&err);
        }
        self.close(ctx);
    }

    fn close(&self, ctx: &mut T) {
        if let Err(err) = ctx.close() {
            self.diagnostics.close_failed(&err);
        }
    }
}
