//! Collector - drains the result queue
//!
//! The collector runs for the whole walk and counts every result the
//! workers emit. It never applies backpressure of its own; its only job is
//! to keep the bounded result queue from stalling the workers. It returns
//! once every worker has dropped its result sender.
//!
//! While it waits, the collector also watches the walk's token. An external
//! cancel or an expired deadline is recorded in the error group the moment
//! it happens, even when every worker is busy inside a long transform.

use crate::walker::group::ErrorGroup;
use crate::walker::queue::QueueReceiver;
use crate::walker::stats::WalkCounters;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Drain `results` until it is closed, returning the number of results seen
pub fn collect(
    results: QueueReceiver<PathBuf>,
    counters: &WalkCounters,
    group: &ErrorGroup,
) -> u64 {
    let cancel = group.token();
    let mut collected = 0u64;
    let mut watching = true;

    loop {
        let result = if watching {
            match results.recv(cancel) {
                Some(result) => result,
                None if cancel.is_cancelled() => {
                    debug!("Collector observed cancellation, draining");
                    group.record(cancel.error());
                    watching = false;
                    continue;
                }
                None => break,
            }
        } else {
            match results.recv_until_closed() {
                Some(result) => result,
                None => break,
            }
        };

        trace!(result = %result.display(), "Collected result");
        counters.record_result();
        collected += 1;
    }

    debug!(collected, "Collector finished");
    collected
}
