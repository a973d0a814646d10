//! Error types for csv-harvester
//!
//! This module defines a structured error hierarchy that covers:
//! - Directory scanning errors (permissions, missing paths, I/O)
//! - CSV open/parse errors
//! - Output sink errors
//! - Configuration and CLI errors
//! - Worker thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Every error is caught at its smallest enclosing scope (one directory
//!   listing, one file, one write) and logged as a non-fatal warning
//! - The only fatal condition is failing to initialize the output header

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the csv-harvester application
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Directory scanning errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// CSV file errors
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Output sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while listing a directory
#[derive(Error, Debug)]
pub enum ScanError {
    /// Permission denied
    #[error("Access denied: '{path}'")]
    AccessDenied { path: PathBuf },

    /// Path not found
    #[error("Path not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Directory listing failed for another reason
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while listing `path`
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::PermissionDenied => ScanError::AccessDenied {
                path: path.to_path_buf(),
            },
            ErrorKind::NotFound => ScanError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ScanError::ReadDirFailed {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Check if this error is recoverable (skip the subtree and continue)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::AccessDenied { .. } | ScanError::NotFound { .. }
        )
    }
}

/// Errors raised while reading one CSV file
#[derive(Error, Debug)]
pub enum CsvError {
    /// File could not be opened
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record could not be parsed
    #[error("Failed to parse '{path}': {source}")]
    Parse { path: PathBuf, source: csv::Error },
}

/// Output sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// Failed to create the output file or write its header.
    /// This is the sole fatal error of a run.
    #[error("Failed to initialize output file '{path}': {source}")]
    HeaderInit {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Sink channel closed unexpectedly
    #[error("Output sink channel closed unexpectedly")]
    ChannelClosed,

    /// Writer thread panicked
    #[error("Output writer thread panicked")]
    WriterPanicked,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Root directory missing or not a directory
    #[error("Invalid root directory '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Output or log path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Work queue send failed
    #[error("Failed to send work item: queue closed")]
    QueueSendFailed,

    /// Worker initialization failed
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },
}

/// Result type alias for HarvestError
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for SinkError
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Represents the outcome of processing a single task
#[derive(Debug)]
pub enum TaskOutcome {
    /// Successfully listed a directory
    DirListed {
        path: PathBuf,
        subdirs: usize,
        files: usize,
    },

    /// Successfully processed a CSV file
    FileProcessed {
        path: PathBuf,
        valid: u64,
        skipped: u64,
    },

    /// Skipped due to a recoverable error
    Skipped { path: PathBuf, reason: String },

    /// Failed with an error
    Failed { path: PathBuf, error: HarvestError },
}

impl TaskOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskOutcome::DirListed { .. } | TaskOutcome::FileProcessed { .. }
        )
    }

    /// Returns the path associated with this outcome
    pub fn path(&self) -> &std::path::Path {
        match self {
            TaskOutcome::DirListed { path, .. } => path,
            TaskOutcome::FileProcessed { path, .. } => path,
            TaskOutcome::Skipped { path, .. } => path,
            TaskOutcome::Failed { path, .. } => path,
        }
    }
}
