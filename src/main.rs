//! snapdiff - Filesystem Metadata Snapshot Diff
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use snapdiff::backend::open_backends;
use snapdiff::config::{CliArgs, DiffConfig};
use snapdiff::engine::{DiffEngine, DiffOptions};
use snapdiff::progress::{print_summary, ProgressReporter};
use snapdiff::report::LineReporter;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

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
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = DiffConfig::from_args(args).context("Invalid configuration")?;

    let backends =
        open_backends(&config.uris, config.page_size).context("Failed to open backends")?;
    info!(backends = backends.len(), "Backends ready");

    let engine = DiffEngine::from_backends(&backends, DiffOptions::from_config(&config))
        .context("Failed to open entry streams")?;

    let stdout = io::stdout();
    let mut reporter = LineReporter::new(BufWriter::new(stdout.lock()), config.format);

    let progress = config.show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Comparing snapshots...");
    }

    let result = engine.run_with_progress(&mut reporter, |stats| {
        if let Some(ref p) = progress {
            p.update(stats);
        }
    });

    if let Some(ref p) = progress {
        p.finish_and_clear();
    }
    let stats = result.context("Diff failed")?;

    if config.show_summary {
        let uris: Vec<&str> = config.uris.iter().map(|u| u.raw.as_str()).collect();
        print_summary(&stats, &uris);
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("snapdiff=debug,warn")
    } else {
        EnvFilter::new("snapdiff=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
