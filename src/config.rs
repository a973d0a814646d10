//! Configuration types for csv-harvester
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 100;

/// Parallel scanner that validates and merges CustomerData CSV files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "csv-harvester",
    version,
    about = "Parallel directory scanner that validates and merges CustomerData CSV files",
    long_about = "Recursively scans a directory tree for CSV files matching a naming pattern,\n\
                  validates each data row, tags valid rows with a date derived from their\n\
                  directory path, and merges them into a single output file.",
    after_help = "EXAMPLES:\n    \
        csv-harvester ./sample-data -o output.csv -l harvest.log\n    \
        csv-harvester /data/exports -w 8 --prefix CustomerData\n    \
        csv-harvester /data/exports -q -o merged.csv"
)]
pub struct CliArgs {
    /// Root directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Output CSV file (truncated at the start of each run)
    #[arg(short, long, default_value = "output.csv", value_name = "FILE")]
    pub output: PathBuf,

    /// Run log file (appended, never truncated)
    #[arg(short, long, default_value = "harvest.log", value_name = "FILE")]
    pub log: PathBuf,

    /// Number of worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Work queue size (controls memory usage)
    #[arg(long, default_value = "10000", value_name = "NUM")]
    pub queue_size: usize,

    /// File name prefix to match
    #[arg(long, default_value = "CustomerData", value_name = "PREFIX")]
    pub prefix: String,

    /// File extension to match (without the dot)
    #[arg(long, default_value = "csv", value_name = "EXT")]
    pub extension: String,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-file and per-directory events)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Root directory to scan
    pub root: PathBuf,

    /// Output CSV path
    pub output_path: PathBuf,

    /// Run log path
    pub log_path: PathBuf,

    /// Number of worker threads
    pub worker_count: usize,

    /// Work queue capacity
    pub queue_size: usize,

    /// File name prefix to match
    pub file_prefix: String,

    /// File extension to match (without the dot)
    pub file_extension: String,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl HarvestConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Validate root directory
        if !args.root.exists() {
            return Err(ConfigError::InvalidRoot {
                path: args.root,
                reason: "Directory does not exist".into(),
            });
        }
        if !args.root.is_dir() {
            return Err(ConfigError::InvalidRoot {
                path: args.root,
                reason: "Not a directory".into(),
            });
        }

        // Validate worker count
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        // Validate queue size
        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        // Validate output and log parent directories
        for path in [&args.output, &args.log] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(ConfigError::InvalidOutputPath {
                        path: path.clone(),
                        reason: format!(
                            "Parent directory '{}' does not exist",
                            parent.display()
                        ),
                    });
                }
            }
        }

        Ok(Self {
            root: args.root,
            output_path: args.output,
            log_path: args.log,
            worker_count: args.workers,
            queue_size: args.queue_size,
            file_prefix: args.prefix,
            file_extension: args.extension.trim_start_matches('.').to_string(),
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Check if a file name matches the harvest pattern
    /// (prefix match plus extension match, e.g. `CustomerData*.csv`)
    pub fn is_candidate(&self, name: &str) -> bool {
        name.starts_with(&self.file_prefix)
            && Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.file_extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> HarvestConfig {
        HarvestConfig {
            root: PathBuf::from("/data"),
            output_path: PathBuf::from("output.csv"),
            log_path: PathBuf::from("harvest.log"),
            worker_count: 4,
            queue_size: 1000,
            file_prefix: "CustomerData".into(),
            file_extension: "csv".into(),
            show_progress: false,
            verbose: false,
        }
    }

    #[test]
    fn test_candidate_matching() {
        let config = test_config();

        assert!(config.is_candidate("CustomerData.csv"));
        assert!(config.is_candidate("CustomerData_2023.csv"));
        assert!(config.is_candidate("CustomerData1.CSV"));

        assert!(!config.is_candidate("customerdata.csv"));
        assert!(!config.is_candidate("CustomerData.txt"));
        assert!(!config.is_candidate("Orders.csv"));
        assert!(!config.is_candidate("CustomerData"));
    }

    #[test]
    fn test_invalid_worker_count() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs::try_parse_from([
            "csv-harvester",
            dir.path().to_str().unwrap(),
            "-w",
            "0",
        ])
        .unwrap();

        let err = HarvestConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { .. }));
    }

    #[test]
    fn test_invalid_queue_size() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs::try_parse_from([
            "csv-harvester",
            dir.path().to_str().unwrap(),
            "--queue-size",
            "10",
        ])
        .unwrap();

        let err = HarvestConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQueueSize { .. }));
    }

    #[test]
    fn test_missing_root() {
        let args =
            CliArgs::try_parse_from(["csv-harvester", "/definitely/not/here"]).unwrap();
        let err = HarvestConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot { .. }));
    }

    #[test]
    fn test_valid_args() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        let log = dir.path().join("run.log");
        let args = CliArgs::try_parse_from([
            "csv-harvester",
            dir.path().to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-l",
            log.to_str().unwrap(),
            "--extension",
            ".csv",
        ])
        .unwrap();

        let config = HarvestConfig::from_args(args).unwrap();
        assert_eq!(config.file_extension, "csv");
        assert!(config.worker_count >= 1);
        assert!(config.show_progress);
    }
}
