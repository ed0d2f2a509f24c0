//! First-error-wins group for the walk participants
//!
//! The producer, every worker and the collector report to one
//! [`ErrorGroup`]. The first error recorded is kept and the group's token is
//! cancelled so that all other participants unwind. An error that triggers
//! the cancellation is stored before the token is cancelled, so the
//! cancellation errors of the participants it unwinds never take its place.
//! An external cancel or an expired deadline is itself the first cause when
//! it is recorded first.

use crate::error::{Result, WalkerError};
use crate::walker::cancel::CancelToken;
use parking_lot::Mutex;
use tracing::debug;

/// Collects the first error of a set of concurrent tasks
pub struct ErrorGroup {
    /// Token shared by every task in the group
    cancel: CancelToken,

    /// First error observed
    first: Mutex<Option<WalkerError>>,
}

impl ErrorGroup {
    /// Create a group bound to `cancel`
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            first: Mutex::new(None),
        }
    }

    /// Token shared by every task in the group
    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Record the outcome of one task
    pub fn settle(&self, outcome: Result<()>) {
        if let Err(err) = outcome {
            self.record(err);
        }
    }

    /// Record an error and cancel every other task.
    ///
    /// Only the first error is kept; later ones are logged and dropped.
    pub fn record(&self, err: WalkerError) {
        {
            let mut first = self.first.lock();
            match first.as_ref() {
                None => *first = Some(err),
                Some(_) => debug!(error = %err, "Discarding secondary walk error"),
            }
        }
        self.cancel.cancel();
    }

    /// Check whether any task has failed so far
    pub fn has_failed(&self) -> bool {
        self.first.lock().is_some()
    }

    /// Consume the group, returning the first error if there was one
    pub fn into_result(self) -> Result<()> {
        match self.first.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
