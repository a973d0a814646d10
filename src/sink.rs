//! Serialized output sink for validated rows
//!
//! This module provides the single shared output file. All appends funnel
//! through a dedicated writer thread reached via a bounded channel, so each
//! batch lands as one contiguous, uncorrupted unit no matter how many
//! workers finish files concurrently.
//!
//! # Initialization ordering
//!
//! [`OutputSink::create`] truncates the file and writes the fixed header
//! line on the calling thread, before the writer thread is spawned and
//! before any worker starts. A header failure is the sole fatal error of a
//! run; nothing written afterwards could be trusted.

use crate::error::{SinkError, SinkResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Fixed header line written once before any worker starts
pub const OUTPUT_HEADER: &str = "FirstName,LastName,StreetNumber,Street,City,\
Province,PostalCode,Country,PhoneNumber,EmailAddress,Date";

/// Message types sent to the writer thread
#[derive(Debug)]
enum SinkMessage {
    /// Append a batch of pre-formatted lines
    Batch(Vec<String>),

    /// Flush buffered output to disk
    Flush,

    /// Flush and stop the writer
    Shutdown,
}

/// Statistics about sink writes
#[derive(Debug, Default)]
pub struct SinkStats {
    /// Total data lines written (excluding the header)
    lines_written: AtomicU64,

    /// Total batches written
    batches_written: AtomicU64,

    /// Batches that failed to write and were dropped
    batches_failed: AtomicU64,
}

impl SinkStats {
    /// Get total data lines written
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    /// Get total batches written
    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    /// Get total batches dropped due to write failures
    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }
}

/// Handle for appending batches to the sink
#[derive(Clone, Debug)]
pub struct SinkHandle {
    sender: Sender<SinkMessage>,
    stats: Arc<SinkStats>,
}

impl SinkHandle {
    /// Append a batch of lines as one contiguous unit.
    ///
    /// Empty batches are dropped without touching the channel; a file that
    /// produced no valid rows performs no write.
    pub fn append(&self, lines: Vec<String>) -> SinkResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        self.sender
            .send(SinkMessage::Batch(lines))
            .map_err(|_| SinkError::ChannelClosed)
    }

    /// Request a flush of buffered output
    pub fn flush(&self) -> SinkResult<()> {
        self.sender
            .send(SinkMessage::Flush)
            .map_err(|_| SinkError::ChannelClosed)
    }

    /// Get sink statistics
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }
}

/// Append-only output file with a dedicated writer thread
#[derive(Debug)]
pub struct OutputSink {
    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Handle for sending batches
    sink_handle: SinkHandle,

    /// Output file path
    path: PathBuf,
}

impl OutputSink {
    /// Truncate/create the output file, write the header line, and spawn
    /// the writer thread.
    ///
    /// The header is durable before this function returns, which is what
    /// guarantees header-write-completes-before-any-worker-starts.
    pub fn create(path: &Path, channel_size: usize) -> SinkResult<Self> {
        let mut writer = File::create(path)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                writeln!(writer, "{}", OUTPUT_HEADER)?;
                writer.flush()?;
                Ok(writer)
            })
            .map_err(|e| SinkError::HeaderInit {
                path: path.to_path_buf(),
                source: e,
            })?;

        let (sender, receiver) = bounded(channel_size);
        let stats = Arc::new(SinkStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name("output-writer".into())
            .spawn(move || writer_thread(&mut writer, &receiver, &stats_clone))
            .map_err(|e| SinkError::HeaderInit {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!(path = %path.display(), "Output sink initialized");

        Ok(Self {
            handle: Some(handle),
            sink_handle: SinkHandle { sender, stats },
            path: path.to_path_buf(),
        })
    }

    /// Get a handle for appending batches (clone per worker)
    pub fn handle(&self) -> SinkHandle {
        self.sink_handle.clone()
    }

    /// Get the output file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush remaining batches and join the writer thread
    pub fn finish(mut self) -> SinkResult<()> {
        let _ = self.sink_handle.sender.send(SinkMessage::Shutdown);

        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| SinkError::WriterPanicked)?;
        }

        Ok(())
    }
}

/// Internal writer thread function
///
/// A failed batch write is caught at the scope of that one batch: it is
/// logged, counted, and the writer keeps serving later batches. Only the
/// header write - done before this thread exists - can abort a run.
fn writer_thread<W: Write>(writer: &mut W, receiver: &Receiver<SinkMessage>, stats: &SinkStats) {
    loop {
        match receiver.recv() {
            Ok(SinkMessage::Batch(lines)) => {
                if let Err(e) = write_batch(writer, &lines) {
                    stats.batches_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        error = %e,
                        lines = lines.len(),
                        "Failed to write batch, continuing"
                    );
                    continue;
                }
                stats
                    .lines_written
                    .fetch_add(lines.len() as u64, Ordering::Relaxed);
                stats.batches_written.fetch_add(1, Ordering::Relaxed);
            }
            Ok(SinkMessage::Flush) => {
                if let Err(e) = writer.flush() {
                    warn!(error = %e, "Failed to flush output");
                }
            }
            Ok(SinkMessage::Shutdown) | Err(_) => {
                // Channel drained or all senders gone - final flush
                if let Err(e) = writer.flush() {
                    warn!(error = %e, "Failed to flush output on shutdown");
                }
                return;
            }
        }
    }
}

fn write_batch<W: Write>(writer: &mut W, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}
