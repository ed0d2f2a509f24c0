//! Producer - discovers eligible paths
//!
//! A single producer walks the tree depth-first, without following symlinks,
//! and publishes every eligible path onto the bounded path queue. It stops at
//! the first traversal error, on an invalid pattern, or when the walk is
//! cancelled. The path queue closes when the producer returns, because the
//! producer owns the only sender.

use crate::config::FilterConfig;
use crate::error::{Result, WalkerError};
use crate::walker::cancel::CancelToken;
use crate::walker::filter::PathFilter;
use crate::walker::queue::QueueSender;
use crate::walker::stats::WalkCounters;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Walk `root` and send each eligible path to `paths`
pub fn produce(
    root: &Path,
    filter: &FilterConfig,
    paths: QueueSender<PathBuf>,
    counters: &WalkCounters,
    cancel: &CancelToken,
) -> Result<()> {
    let filter = PathFilter::new(filter)?;

    debug!(root = %root.display(), "Producer starting");

    for entry in WalkDir::new(root).follow_links(false) {
        if cancel.is_cancelled() {
            debug!("Producer cancelled");
            return Err(cancel.error());
        }

        let entry = entry.map_err(|source| traversal_error(root, source))?;

        if !filter.eligible(&entry) {
            continue;
        }

        trace!(path = %entry.path().display(), "Discovered path");
        counters.record_path();
        paths.send(entry.into_path(), cancel)?;
    }

    debug!(paths = counters.paths(), "Producer finished");
    Ok(())
}

fn traversal_error(root: &Path, source: walkdir::Error) -> WalkerError {
    let path = source
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    WalkerError::Traversal { path, source }
}
