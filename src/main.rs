//! urfs - Perform computations on files in a large directory
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use urfs::config::{CliArgs, Command, WalkConfig};
use urfs::progress::{print_dir_size, print_header, print_sample_summary, ProgressReporter};
use urfs::{CancelToken, FsWalker};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = WalkConfig::from_args(&args).context("Invalid configuration")?;
    let show_progress = !args.quiet;

    // Setup signal handler for graceful shutdown
    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        interrupt.cancel();
    })
    .context("Failed to set signal handler")?;

    let workers = config.workers;
    let pattern = config.filter.pattern.clone();
    let mut walker =
        FsWalker::with_config(config, cancel).context("Failed to initialize walker")?;

    match args.command {
        Command::Sample { src, dst, fraction } => {
            if show_progress {
                print_header("sample", workers, &pattern);
            }

            let progress =
                show_progress.then(|| ProgressReporter::start(walker.progress_handle()));
            let result = walker.sample(&src, &dst, fraction);
            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            let report = result.with_context(|| {
                format!("Failed to sample {} into {}", src.display(), dst.display())
            })?;

            if show_progress {
                print_sample_summary(&report);
            } else {
                println!("{}", report);
            }
        }

        Command::Count { dirs } => {
            if show_progress {
                print_header("count", workers, &pattern);
            }

            let sizes = walker
                .count_each(&dirs, |size| {
                    if show_progress {
                        print_dir_size(size);
                    } else {
                        println!("{}", size);
                    }
                })
                .context("Count failed")?;

            info!(directories = sizes.len(), "Count complete");
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("urfs=debug,warn")
    } else {
        EnvFilter::new("urfs=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
