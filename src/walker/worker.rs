//! Worker logic for the transform pool
//!
//! Each worker:
//! - Pulls paths from the shared path queue (multi-consumer, so work is
//!   balanced dynamically across the pool)
//! - Runs the caller's transform on one path at a time
//! - Forwards non-empty results to the result queue
//! - Stops at the first transform error, which is fatal for the whole walk

use crate::error::{BoxError, Result, WalkerError, WorkerError};
use crate::walker::cancel::CancelToken;
use crate::walker::queue::{QueueReceiver, QueueSender};
use crate::walker::stats::{WalkCounters, WorkGuard};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Per-worker tallies, logged when the worker stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Paths the transform was applied to
    pub processed: u64,

    /// Results forwarded to the collector
    pub emitted: u64,
}

/// Consume paths until the queue is closed and drained or the walk is
/// cancelled
pub fn consume<F, E>(
    id: usize,
    paths: QueueReceiver<PathBuf>,
    results: QueueSender<PathBuf>,
    transform: &F,
    counters: &WalkCounters,
    cancel: &CancelToken,
) -> Result<WorkerSummary>
where
    F: Fn(&Path) -> std::result::Result<Option<PathBuf>, E> + Sync,
    E: Into<BoxError>,
{
    let mut summary = WorkerSummary::default();

    while let Some(path) = paths.recv(cancel) {
        // Nothing new is scheduled once the walk is cancelled
        if cancel.is_cancelled() {
            break;
        }

        let outcome = {
            let _guard = WorkGuard::new(counters);
            run_transform(id, &path, transform)?
        };
        summary.processed += 1;

        if let Some(result) = outcome {
            trace!(worker = id, path = %path.display(), result = %result.display(), "Path transformed");
            results.send(result, cancel)?;
            summary.emitted += 1;
        }
    }

    debug!(
        worker = id,
        processed = summary.processed,
        emitted = summary.emitted,
        "Worker stopping"
    );

    match cancel.err() {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

/// Apply the transform to one path, turning failures and panics into
/// walk errors
fn run_transform<F, E>(id: usize, path: &Path, transform: &F) -> Result<Option<PathBuf>>
where
    F: Fn(&Path) -> std::result::Result<Option<PathBuf>, E> + Sync,
    E: Into<BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| transform(path))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(WalkerError::transform(path, err)),
        Err(payload) => Err(WorkerError::Panicked {
            role: worker_name(id),
            message: panic_message(payload.as_ref()),
        }
        .into()),
    }
}

/// Thread name for a worker
pub fn worker_name(id: usize) -> String {
    format!("walk-worker-{}", id)
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::queue::{PathQueue, ResultQueue};
    use std::io;

    fn fill(queue: &mut PathQueue, items: &[&str]) -> QueueReceiver<PathBuf> {
        let cancel = CancelToken::new();
        let (tx, rx) = queue.split().unwrap();
        for item in items {
            tx.send(PathBuf::from(item), &cancel).unwrap();
        }
        rx
    }

    #[test]
    fn test_worker_forwards_non_empty_results() {
        let mut paths = PathQueue::new(8);
        let rx = fill(&mut paths, &["/a", "/b", "/skip", "/c"]);

        let mut results = ResultQueue::new(8);
        let (result_tx, result_rx) = results.split().unwrap();
        let counters = WalkCounters::default();
        let cancel = CancelToken::new();

        let transform = |path: &Path| -> io::Result<Option<PathBuf>> {
            if path.ends_with("skip") {
                Ok(None)
            } else {
                Ok(Some(path.with_extension("out")))
            }
        };

        let summary = consume(0, rx, result_tx, &transform, &counters, &cancel).unwrap();

        assert_eq!(
            summary,
            WorkerSummary {
                processed: 4,
                emitted: 3
            }
        );
        assert_eq!(result_rx.len(), 3);
        assert_eq!(counters.active_workers(), 0);
    }

    #[test]
    fn test_worker_stops_on_transform_error() {
        let mut paths = PathQueue::new(8);
        let rx = fill(&mut paths, &["/ok", "/bad", "/never"]);

        let mut results = ResultQueue::new(8);
        let (result_tx, _result_rx) = results.split().unwrap();

        let transform = |path: &Path| -> io::Result<Option<PathBuf>> {
            if path.ends_with("bad") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            } else {
                Ok(Some(path.to_path_buf()))
            }
        };

        let result = consume(
            0,
            rx.clone(),
            result_tx,
            &transform,
            &WalkCounters::default(),
            &CancelToken::new(),
        );

        match result {
            Err(WalkerError::Transform { path, .. }) => assert_eq!(path, PathBuf::from("/bad")),
            other => panic!("unexpected result: {:?}", other),
        }
        // The remaining path was never taken from the queue
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_worker_reports_panics() {
        let mut paths = PathQueue::new(8);
        let rx = fill(&mut paths, &["/boom"]);

        let mut results = ResultQueue::new(8);
        let (result_tx, _result_rx) = results.split().unwrap();

        let transform = |_: &Path| -> io::Result<Option<PathBuf>> { panic!("transform exploded") };

        let result = consume(
            3,
            rx,
            result_tx,
            &transform,
            &WalkCounters::default(),
            &CancelToken::new(),
        );

        match result {
            Err(WalkerError::Worker(WorkerError::Panicked { role, message })) => {
                assert_eq!(role, "walk-worker-3");
                assert_eq!(message, "transform exploded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_worker_returns_cancellation() {
        let mut paths = PathQueue::new(8);
        let rx = fill(&mut paths, &["/a", "/b"]);

        let mut results = ResultQueue::new(8);
        let (result_tx, _result_rx) = results.split().unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();

        let transform = |path: &Path| -> io::Result<Option<PathBuf>> { Ok(Some(path.to_path_buf())) };
        let result = consume(0, rx, result_tx, &transform, &WalkCounters::default(), &cancel);

        assert!(matches!(result, Err(WalkerError::Cancelled)));
    }
}
