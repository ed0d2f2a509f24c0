//! Bounded queues with cancellable send and receive
//!
//! Both the path queue (producer -> workers) and the result queue
//! (workers -> collector) are bounded crossbeam channels. A full queue blocks
//! the sender, which is the engine's only backpressure mechanism. Every
//! blocking operation also watches the walk's [`CancelToken`] so that no
//! participant can stay blocked after the walk has been cancelled.
//!
//! A queue hands out its endpoints once per walk through [`WorkQueue::split`].
//! The channel closes when the last sender handle is dropped, so the queue
//! itself never keeps an endpoint alive while a walk is running.

use crate::error::{Result, WalkerError};
use crate::walker::cancel::CancelToken;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Queue of eligible paths discovered by the producer
pub type PathQueue = WorkQueue<PathBuf>;

/// Queue of non-empty transform results
pub type ResultQueue = WorkQueue<PathBuf>;

/// Statistics for a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,

    /// Number of sends that found the queue full and had to wait
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    /// Items currently buffered (approximate while the walk is running)
    pub fn depth(&self) -> u64 {
        let dequeued = self.dequeued.load(Ordering::Relaxed);
        self.enqueued
            .load(Ordering::Relaxed)
            .saturating_sub(dequeued)
    }

    /// Get backpressure event count
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.dequeued.store(0, Ordering::Relaxed);
        self.backpressure_events.store(0, Ordering::Relaxed);
    }
}

/// Bounded single-walk queue
pub struct WorkQueue<T> {
    /// Endpoints not yet handed out to a walk
    endpoints: Option<(Sender<T>, Receiver<T>)>,

    /// Queue statistics (survives resets)
    stats: Arc<QueueStats>,
}

impl<T> WorkQueue<T> {
    /// Create a new queue with the specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            endpoints: Some(bounded(capacity)),
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Take the endpoints for a walk.
    ///
    /// Returns `None` if they were already taken and the queue has not been
    /// reset since.
    pub fn split(&mut self) -> Option<(QueueSender<T>, QueueReceiver<T>)> {
        let (sender, receiver) = self.endpoints.take()?;
        Some((
            QueueSender {
                sender,
                stats: Arc::clone(&self.stats),
            },
            QueueReceiver {
                receiver,
                stats: Arc::clone(&self.stats),
            },
        ))
    }

    /// Replace the channel with a fresh, empty one and zero the statistics
    pub fn reset(&mut self, capacity: usize) {
        self.endpoints = Some(bounded(capacity));
        self.stats.reset();
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Handle for sending items to the queue
pub struct QueueSender<T> {
    sender: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueSender<T> {
    /// Send an item, blocking while the queue is full.
    ///
    /// Fails with the token's cancellation error if the token is cancelled
    /// or its deadline passes before the item could be queued.
    pub fn send(&self, item: T, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(cancel.error());
        }

        let item = match self.sender.try_send(item) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Full(item)) => {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                item
            }
            // Every receiver is gone, which only happens once the walk is
            // being torn down
            Err(TrySendError::Disconnected(_)) => return Err(disconnected(cancel)),
        };

        let deadline = cancel.deadline_channel();
        select! {
            send(self.sender, item) -> res => match res {
                Ok(()) => {
                    self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                Err(_) => Err(disconnected(cancel)),
            },
            recv(cancel.done()) -> _ => Err(cancel.error()),
            recv(deadline) -> _ => {
                cancel.expire();
                Err(cancel.error())
            }
        }
    }
}

/// Handle for receiving items from the queue
pub struct QueueReceiver<T> {
    receiver: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Receive the next item.
    ///
    /// Returns `None` once the queue is closed and drained, or as soon as
    /// the token is cancelled.
    pub fn recv(&self, cancel: &CancelToken) -> Option<T> {
        if cancel.is_cancelled() {
            return None;
        }

        let deadline = cancel.deadline_channel();
        let item = select! {
            recv(self.receiver) -> msg => msg.ok(),
            recv(cancel.done()) -> _ => None,
            recv(deadline) -> _ => {
                cancel.expire();
                None
            }
        };
        let item = item?;

        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Receive the next item, ignoring cancellation.
    ///
    /// Returns `None` only once every sender has been dropped and the queue
    /// is drained.
    pub fn recv_until_closed(&self) -> Option<T> {
        let item = self.receiver.recv().ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

fn disconnected(cancel: &CancelToken) -> WalkerError {
    cancel.err().unwrap_or(WalkerError::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_queue_basic() {
        let mut queue: WorkQueue<PathBuf> = WorkQueue::new(10);
        let cancel = CancelToken::new();

        let (sender, receiver) = queue.split().unwrap();
        sender.send(PathBuf::from("/test"), &cancel).unwrap();
        assert_eq!(receiver.len(), 1);

        let item = receiver.recv(&cancel).unwrap();
        assert_eq!(item, PathBuf::from("/test"));
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_split_once_until_reset() {
        let mut queue: WorkQueue<u32> = WorkQueue::new(4);
        let cancel = CancelToken::new();

        let (sender, _receiver) = queue.split().unwrap();
        sender.send(1, &cancel).unwrap();
        assert!(queue.split().is_none());

        queue.reset(2);
        let (sender, receiver) = queue.split().unwrap();
        // The fresh channel starts empty with the new capacity
        assert!(receiver.is_empty());
        sender.send(1, &cancel).unwrap();
        sender.send(2, &cancel).unwrap();
        assert_eq!(receiver.len(), 2);
        assert_eq!(queue.stats().backpressure_count(), 0);
    }

    #[test]
    fn test_queue_closes_when_senders_dropped() {
        let mut queue: WorkQueue<u32> = WorkQueue::new(4);
        let cancel = CancelToken::new();
        let (sender, receiver) = queue.split().unwrap();

        sender.send(1, &cancel).unwrap();
        sender.send(2, &cancel).unwrap();
        drop(sender);

        assert_eq!(receiver.recv(&cancel), Some(1));
        assert_eq!(receiver.recv(&cancel), Some(2));
        assert_eq!(receiver.recv(&cancel), None);
    }

    #[test]
    fn test_blocked_send_unblocks_on_cancel() {
        let mut queue: WorkQueue<u32> = WorkQueue::new(1);
        let cancel = CancelToken::new();
        let (sender, _receiver) = queue.split().unwrap();

        sender.send(1, &cancel).unwrap();

        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        // Queue is full and nobody is receiving
        let result = sender.send(2, &cancel);
        handle.join().unwrap();

        assert!(matches!(result, Err(WalkerError::Cancelled)));
        assert_eq!(queue.stats().backpressure_count(), 1);
    }

    #[test]
    fn test_blocked_recv_unblocks_on_deadline() {
        let mut queue: WorkQueue<u32> = WorkQueue::new(1);
        let cancel = CancelToken::with_deadline(Duration::from_millis(30));
        let (_sender, receiver) = queue.split().unwrap();

        let started = Instant::now();
        assert_eq!(receiver.recv(&cancel), None);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(cancel.err(), Some(WalkerError::DeadlineExceeded)));
    }

    #[test]
    fn test_queue_stats() {
        let mut queue: WorkQueue<u32> = WorkQueue::new(10);
        let cancel = CancelToken::new();
        let (sender, receiver) = queue.split().unwrap();

        sender.send(1, &cancel).unwrap();
        sender.send(2, &cancel).unwrap();
        sender.send(3, &cancel).unwrap();
        receiver.recv(&cancel).unwrap();

        let stats = queue.stats();
        assert_eq!(stats.enqueued.load(Ordering::Relaxed), 3);
        assert_eq!(stats.dequeued.load(Ordering::Relaxed), 1);
        assert_eq!(stats.depth(), 2);

        queue.reset(10);
        assert_eq!(stats.depth(), 0);
    }
}
