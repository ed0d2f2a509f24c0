//! Terminal output for the urfs binary
//!
//! A spinner shows live walk progress, refreshed by a ticker thread that
//! reads [`ProgressHandle`] snapshots. Summaries are printed with `console`
//! styling and human-readable sizes.

use crate::count::DirSize;
use crate::sample::SampleReport;
use crate::walker::{ProgressHandle, WalkProgress};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// How often the spinner message is refreshed
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Live progress display for a running walk
pub struct ProgressReporter {
    bar: ProgressBar,

    /// Tells the ticker thread to stop
    stop: Arc<AtomicBool>,

    ticker: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Start displaying progress read from `handle`
    pub fn start(handle: ProgressHandle) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(spinner.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        bar.enable_steady_tick(REFRESH_INTERVAL);

        let stop = Arc::new(AtomicBool::new(false));
        let ticker = {
            let bar = bar.clone();
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("progress".to_string())
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        bar.set_message(progress_message(&handle.snapshot()));
                        thread::sleep(REFRESH_INTERVAL);
                    }
                })
        };

        let ticker = match ticker {
            Ok(ticker) => Some(ticker),
            Err(e) => {
                debug!(error = %e, "Progress ticker unavailable");
                None
            }
        };

        Self { bar, stop, ticker }
    }

    /// Stop refreshing and remove the spinner
    pub fn finish_and_clear(mut self) {
        self.stop_ticker();
        self.bar.finish_and_clear();
    }

    fn stop_ticker(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

fn progress_message(progress: &WalkProgress) -> String {
    format!(
        "Paths: {} | Results: {} | Rate: {:.0}/s | Queued: {}/{} | Workers: {}/{}",
        format_number(progress.paths),
        format_number(progress.results),
        progress.paths_per_second(),
        progress.queued_paths,
        progress.queued_results,
        progress.active_workers,
        progress.total_workers,
    )
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print the outcome of a sample run
pub fn print_sample_summary(report: &SampleReport) {
    let secs = report.duration.as_secs_f64();
    let rate = if secs > 0.0 {
        report.total as f64 / secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Sample Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Files seen:").bold(), format_number(report.total));
    println!(
        "  {} {} ({:.1}%)",
        style("Sampled:").bold(),
        format_number(report.sampled),
        report.percent()
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        secs,
        rate
    );
    println!();
}

/// Print one counted directory
pub fn print_dir_size(size: &DirSize) {
    println!(
        "{} {} files, {} ({} per file)",
        style(format!("{}:", size.path().display())).bold(),
        format_number(size.files()),
        format_size(size.bytes(), BINARY),
        format_size(size.mean() as u64, BINARY),
    );
}

/// Print a header at the start of a run
pub fn print_header(command: &str, workers: usize, pattern: &str) {
    println!();
    println!(
        "{} {}",
        style("urfs").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Command:").bold(), command);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Match:").bold(), pattern);
    println!();
}
