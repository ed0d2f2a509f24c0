//! Cancellation tokens with optional deadlines
//!
//! A [`CancelToken`] is shared by every participant of a walk. It can be
//! cancelled explicitly, or it expires once its deadline passes. Blocking
//! channel operations race against it inside `crossbeam_channel::select!`
//! through two receivers:
//!
//! - [`CancelToken::done`] never yields a message; it becomes disconnected
//!   (and therefore ready) the moment the token is cancelled.
//! - [`CancelToken::deadline_channel`] fires once at the deadline, or never.
//!
//! Child tokens are cancelled together with their parent and inherit the
//! parent's deadline when it is earlier than their own.

use crate::error::WalkerError;
use crossbeam_channel::{at, bounded, never, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

const ACTIVE: u8 = 0;
const CANCELLED: u8 = 1;
const EXPIRED: u8 = 2;

struct Inner {
    /// ACTIVE, CANCELLED or EXPIRED
    state: AtomicU8,

    /// Dropped on cancellation, which disconnects `done_rx`
    done_tx: Mutex<Option<Sender<()>>>,

    done_rx: Receiver<()>,

    deadline: Option<Instant>,

    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new(deadline: Option<Instant>) -> Self {
        let (done_tx, done_rx) = bounded(0);
        Self {
            state: AtomicU8::new(ACTIVE),
            done_tx: Mutex::new(Some(done_tx)),
            done_rx,
            deadline,
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel_with(&self, reason: u8) {
        if self
            .state
            .compare_exchange(ACTIVE, reason, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        self.done_tx.lock().take();

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel_with(reason);
        }
    }
}

/// Shared cancellation signal for a walk
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a root token with no deadline
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new(None)),
        }
    }

    /// Create a root token that expires after `timeout`
    pub fn with_deadline(timeout: Duration) -> Self {
        Self::new().with_timeout(timeout)
    }

    /// Derive a child token that is cancelled with this one
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline)
    }

    /// Derive a child token that additionally expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now().checked_add(timeout);
        let deadline = match (self.inner.deadline, own) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, None) => parent,
            (None, own) => own,
        };
        self.derive(deadline)
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let child = Arc::new(Inner::new(deadline));

        {
            let mut children = self.inner.children.lock();
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }

        // The parent may have been cancelled between the push and now
        match self.inner.state.load(Ordering::SeqCst) {
            ACTIVE => {}
            reason => child.cancel_with(reason),
        }

        Self { inner: child }
    }

    /// Cancel this token and all of its children
    pub fn cancel(&self) {
        self.inner.cancel_with(CANCELLED);
    }

    /// Mark this token as expired (deadline reached)
    pub(crate) fn expire(&self) {
        self.inner.cancel_with(EXPIRED);
    }

    /// Check whether the token has been cancelled or its deadline has passed
    pub fn is_cancelled(&self) -> bool {
        if self.inner.state.load(Ordering::SeqCst) != ACTIVE {
            return true;
        }

        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.expire();
                true
            }
            _ => false,
        }
    }

    /// The error describing why the token is no longer active.
    ///
    /// Returns `None` while the token is still active.
    pub fn err(&self) -> Option<WalkerError> {
        if !self.is_cancelled() {
            return None;
        }
        Some(self.error())
    }

    /// The cancellation error for this token, assuming it is cancelled
    pub(crate) fn error(&self) -> WalkerError {
        match self.inner.state.load(Ordering::SeqCst) {
            EXPIRED => WalkerError::DeadlineExceeded,
            _ => WalkerError::Cancelled,
        }
    }

    /// Receiver that becomes ready (disconnected) once the token is cancelled
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done_rx
    }

    /// Receiver that fires once at the deadline, or never without one
    pub fn deadline_channel(&self) -> Receiver<Instant> {
        match self.inner.deadline {
            Some(deadline) => at(deadline),
            None => never(),
        }
    }

    /// The instant this token expires, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}
