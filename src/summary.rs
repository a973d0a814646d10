//! Run summary log
//!
//! After the walk has fully joined, exactly one record is appended to the
//! run log: timestamp, elapsed seconds, and the final valid/skipped row
//! counts. The log is append-only and survives across runs, unlike the
//! output file which is truncated each run.
//!
//! A failure while writing the log is reported by the caller but never
//! invalidates already-written output data.

use crate::walker::ScanResult;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Separator line terminating each log record
const RECORD_SEPARATOR: &str = "--------------------------------------------";

/// Appends one summary record per run to the log file
pub struct RunLogger {
    path: PathBuf,
}

impl RunLogger {
    /// Create a logger for the given log path
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one five-line summary record
    pub fn append(&self, result: &ScanResult) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "Log Entry: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(
            file,
            "Total Execution Time: {} seconds",
            result.duration.as_secs_f64()
        )?;
        writeln!(file, "Total Valid Rows: {}", result.valid_rows)?;
        writeln!(file, "Total Skipped Rows: {}", result.skipped_rows)?;
        writeln!(file, "{}", RECORD_SEPARATOR)?;

        debug!(path = %self.path.display(), "Run summary appended");
        Ok(())
    }
}
