//! csv-harvester - Parallel CustomerData CSV merger
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use csv_harvester::config::{CliArgs, HarvestConfig};
use csv_harvester::progress::{print_header, print_summary, ProgressReporter};
use csv_harvester::summary::RunLogger;
use csv_harvester::walker::ScanCoordinator;
use std::process::ExitCode;
use tracing::{error, info, warn};
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
    setup_logging(args.verbose);

    // Validate and create config
    let config = HarvestConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if config.show_progress {
        print_header(&config.root, config.worker_count, &config.output_path);
    }

    // Create coordinator; this writes the output header and is the one
    // step allowed to abort the run
    let coordinator = ScanCoordinator::new(config.clone())
        .context("Failed to initialize output file")?;

    // Create progress reporter
    let progress = config.show_progress.then(ProgressReporter::new);

    if let Some(ref p) = progress {
        p.set_status("Scanning...");
    }

    // Run the scan; returns only after every spawned task has completed
    let result = coordinator.run(progress.as_ref()).context("Scan failed")?;

    if let Some(ref p) = progress {
        p.finish_and_clear();
    }

    // Append the run summary, exactly once, strictly after the barrier.
    // A log failure must not invalidate the output data we just wrote.
    let logger = RunLogger::new(&config.log_path);
    if let Err(e) = logger.append(&result) {
        warn!(path = %config.log_path.display(), error = %e, "Failed to append run summary");
        eprintln!("Warning: failed to append run summary: {}", e);
    }

    // Print summary
    if config.show_progress {
        print_summary(&result, &config.output_path, &config.log_path);
    }

    if result.errors > 0 {
        info!(errors = result.errors, "Scan completed with errors");
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("csv_harvester=debug,warn")
    } else {
        EnvFilter::new("csv_harvester=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
