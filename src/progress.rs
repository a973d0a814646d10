//! Progress reporting for the tree scan
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::walker::ScanProgress;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress reporter that displays scan status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &ScanProgress) {
        let msg = format!(
            "Dirs: {} | Files: {} | Valid: {} | Skipped: {} | Queue: {} | Workers: {}/{}",
            format_number(progress.dirs),
            format_number(progress.files),
            format_number(progress.valid_rows),
            format_number(progress.skipped_rows),
            progress.queue_size,
            progress.active_workers,
            progress.total_workers,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the scan results
pub fn print_summary(
    result: &crate::walker::ScanResult,
    output_path: &Path,
    log_path: &Path,
) {
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        (result.valid_rows + result.skipped_rows) as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Scan Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(result.dirs_scanned)
    );
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(result.files_processed)
    );
    println!(
        "  {} {}",
        style("Valid Rows:").bold(),
        format_number(result.valid_rows)
    );
    println!(
        "  {} {}",
        style("Skipped Rows:").bold(),
        format_number(result.skipped_rows)
    );
    println!(
        "  {} {:.1}s ({:.0} rows/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if result.errors > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(result.errors)
        );
    }
    println!("  {} {}", style("Output:").bold(), output_path.display());
    println!("  {} {}", style("Log:").bold(), log_path.display());
    println!();
}

/// Print a header at the start of the scan
pub fn print_header(root: &Path, workers: usize, output: &Path) {
    println!();
    println!(
        "{} {}",
        style("csv-harvester").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root.display());
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }
}
