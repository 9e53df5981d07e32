use super::Cancellation;

/// Cancels its token when dropped, including while unwinding from a panic.
///
/// The unit of work holds one of these for the token it hands to the body,
/// so any timers or threads the body started against that token are told to
/// stop as soon as the attempt ends.
#[must_use = "the token is cancelled as soon as the guard is dropped"]
pub struct CancelGuard {
    token: Cancellation,
}

impl CancelGuard {
    pub(crate) fn new(token: Cancellation) -> Self {
        CancelGuard { token }
    }

    /// The guarded token.
    pub fn token(&self) -> &Cancellation {
        &self.token
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
