use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::CancelGuard;

/// Why a token reports itself as cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    /// `cancel()` was called on the token or one of its ancestors.
    #[error("operation cancelled")]
    Cancelled,
    /// The token's deadline (or an inherited one) has passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

struct State {
    cancelled: bool,
    children: Vec<Weak<Inner>>,
}

struct Inner {
    state: Mutex<State>,
    wake: Condvar,
    deadline: Option<Instant>,
}

impl Inner {
    fn new(deadline: Option<Instant>) -> Self {
        Inner {
            state: Mutex::new(State {
                cancelled: false,
                children: Vec::new(),
            }),
            wake: Condvar::new(),
            deadline,
        }
    }

    // A panic while holding the state lock cannot leave `State` half-written,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel(&self) {
        let children = {
            let mut state = self.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            self.wake.notify_all();
            std::mem::take(&mut state.children)
        };

        for child in children {
            if let Some(child) = child.upgrade() {
                child.cancel();
            }
        }
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.deadline.map(|deadline| now >= deadline).unwrap_or(false)
    }
}

/// A cloneable cancellation token with an optional deadline.
///
/// Clones share the same state; `child()` derives a new token that is
/// cancelled whenever this one is.
///
/// ## Example
///
/// ```
/// use sourced_uow::cancel::{CancelReason, Cancellation};
///
/// let parent = Cancellation::new();
/// let child = parent.child();
///
/// parent.cancel();
/// assert!(child.is_cancelled());
/// assert_eq!(child.reason(), Some(CancelReason::Cancelled));
/// ```
#[derive(Clone)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    /// Create a root token with no deadline.
    pub fn new() -> Self {
        Cancellation {
            inner: Arc::new(Inner::new(None)),
        }
    }

    /// Create a root token that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Cancellation {
            inner: Arc::new(Inner::new(Some(deadline))),
        }
    }

    /// Create a root token that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(deadline_after(timeout))
    }

    /// Derive a child token that inherits this token's deadline.
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline)
    }

    /// Derive a child token whose deadline is the earlier of `timeout` from
    /// now and this token's own deadline.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = deadline_after(timeout);
        let deadline = match self.inner.deadline {
            Some(inherited) => inherited.min(own),
            None => own,
        };
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let child = Arc::new(Inner::new(deadline));
        let mut state = self.inner.lock();
        if state.cancelled {
            child.lock().cancelled = true;
        } else {
            state.children.retain(|weak| weak.strong_count() > 0);
            state.children.push(Arc::downgrade(&child));
        }
        Cancellation { inner: child }
    }

    /// Cancel this token and every token derived from it.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// The reason this token is cancelled, if it is.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.inner.lock().cancelled {
            return Some(CancelReason::Cancelled);
        }
        if self.inner.deadline_passed(Instant::now()) {
            return Some(CancelReason::DeadlineExceeded);
        }
        None
    }

    /// `Err(reason)` if the token is cancelled, `Ok(())` otherwise.
    pub fn check(&self) -> Result<(), CancelReason> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline. `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Block until the token is cancelled or `timeout` elapses.
    ///
    /// Returns `true` if the token is cancelled (explicitly or by deadline),
    /// `false` if the timeout elapsed first.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let limit = deadline_after(timeout);
        let mut state = self.inner.lock();
        loop {
            if state.cancelled {
                return true;
            }
            let now = Instant::now();
            if self.inner.deadline_passed(now) {
                return true;
            }
            if now >= limit {
                return false;
            }

            let until = match self.inner.deadline {
                Some(deadline) => deadline.min(limit),
                None => limit,
            };
            state = match self.inner.wake.wait_timeout(state, until - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Return a guard that cancels this token when dropped.
    pub fn cancel_on_drop(&self) -> CancelGuard {
        CancelGuard::new(self.clone())
    }
}

impl fmt::Debug for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancellation")
            .field("reason", &self.reason())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    // Absurdly large timeouts behave like "no deadline for practical purposes".
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365))
}
