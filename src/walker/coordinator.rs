//! Scan coordinator - orchestrates the parallel tree scan
//!
//! The coordinator is responsible for:
//! - Initializing the output sink (header written before any worker starts)
//! - Setting up the work queue and workers
//! - Seeding the root directory and waiting for the completion barrier
//! - Joining workers and collecting final statistics
//!
//! The completion barrier gates everything that follows the walk: only
//! after every enqueued task has been fully processed are the counters
//! read and the run summary written.

use crate::config::HarvestConfig;
use crate::counters::RowCounters;
use crate::error::{Result, WorkerError};
use crate::progress::ProgressReporter;
use crate::sink::OutputSink;
use crate::walker::queue::ScanQueue;
use crate::walker::worker::{aggregate_stats, Worker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of a completed scan
#[derive(Debug)]
pub struct ScanResult {
    /// Total valid rows written to the output
    pub valid_rows: u64,

    /// Total rows rejected by validation
    pub skipped_rows: u64,

    /// Directories listed
    pub dirs_scanned: u64,

    /// CSV files processed
    pub files_processed: u64,

    /// Errors encountered (all non-fatal)
    pub errors: u64,

    /// Paths skipped (permission denied, vanished, etc.)
    pub skipped_paths: u64,

    /// Time taken for the scan
    pub duration: Duration,
}

/// Coordinates the parallel tree scan
pub struct ScanCoordinator {
    /// Configuration
    config: Arc<HarvestConfig>,

    /// Work queue for scan tasks
    queue: ScanQueue,

    /// Output sink (header already written)
    sink: OutputSink,

    /// Shared row counters
    counters: Arc<RowCounters>,

    /// Worker threads
    workers: Vec<Worker>,

    /// Shutdown signal for the worker pool
    shutdown: Arc<AtomicBool>,
}

impl ScanCoordinator {
    /// Create a new scan coordinator.
    ///
    /// This truncates the output file and writes its header line; a header
    /// failure aborts the run before any worker exists, which is what
    /// makes the header-before-workers ordering a hard guarantee.
    pub fn new(config: HarvestConfig) -> Result<Self> {
        let config = Arc::new(config);

        let queue = ScanQueue::new(config.queue_size);

        let sink = OutputSink::create(&config.output_path, config.queue_size)?;

        Ok(Self {
            config,
            queue,
            sink,
            counters: Arc::new(RowCounters::new()),
            workers: Vec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the shared row counters
    pub fn counters(&self) -> Arc<RowCounters> {
        Arc::clone(&self.counters)
    }

    /// Run the scan to completion
    pub fn run(mut self, progress: Option<&ProgressReporter>) -> Result<ScanResult> {
        let start_time = Instant::now();

        info!(
            root = %self.config.root.display(),
            workers = self.config.worker_count,
            output = %self.config.output_path.display(),
            "Starting scan"
        );

        // Seed the queue with the root directory
        self.queue
            .seed(self.config.root.clone())
            .map_err(|_| WorkerError::QueueSendFailed)?;

        // Spawn workers
        self.spawn_workers()?;

        // Barrier: wait until the queue is drained and every worker idle
        self.wait_for_completion(start_time, progress);

        // Signal shutdown and join workers
        self.shutdown.store(true, Ordering::SeqCst);
        let (dirs, files, errors, skipped_paths) = self.join_workers();

        // All workers joined; counter values are final
        let valid_rows = self.counters.valid();
        let skipped_rows = self.counters.skipped();

        // Drain and close the output file
        self.sink.finish()?;

        let duration = start_time.elapsed();

        info!(
            dirs = dirs,
            files = files,
            valid = valid_rows,
            skipped = skipped_rows,
            errors = errors,
            duration_secs = duration.as_secs_f64(),
            "Scan completed"
        );

        Ok(ScanResult {
            valid_rows,
            skipped_rows,
            dirs_scanned: dirs,
            files_processed: files,
            errors,
            skipped_paths,
            duration,
        })
    }

    /// Spawn worker threads
    fn spawn_workers(&mut self) -> Result<()> {
        for id in 0..self.config.worker_count {
            let worker = Worker::spawn(
                id,
                Arc::clone(&self.config),
                self.queue.receiver(),
                self.queue.sender(),
                self.sink.handle(),
                Arc::clone(&self.counters),
                Arc::clone(&self.shutdown),
            )?;

            self.workers.push(worker);
        }

        info!(count = self.workers.len(), "Workers spawned");
        Ok(())
    }

    /// Wait for the scan to complete
    ///
    /// The pending-task count covers both queued tasks and tasks currently
    /// held by a worker, so a zero reading is final - no straggler can
    /// still be about to enqueue children.
    fn wait_for_completion(
        &self,
        start_time: Instant,
        progress: Option<&ProgressReporter>,
    ) {
        let check_interval = Duration::from_millis(50);

        while !self.queue.is_complete() {
            if let Some(p) = progress {
                p.update(&self.snapshot(start_time));
            }

            thread::sleep(check_interval);
        }
    }

    /// Join all worker threads and collect final stats
    fn join_workers(&mut self) -> (u64, u64, u64, u64) {
        let stats = aggregate_stats(&self.workers);

        let workers = std::mem::take(&mut self.workers);
        for worker in workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker failed to join cleanly");
            }
        }

        stats
    }

    /// Snapshot current progress for display
    fn snapshot(&self, start_time: Instant) -> ScanProgress {
        let (dirs, files, errors, _) = aggregate_stats(&self.workers);

        ScanProgress {
            dirs,
            files,
            valid_rows: self.counters.valid(),
            skipped_rows: self.counters.skipped(),
            queue_size: self.queue.len(),
            active_workers: self.queue.active_worker_count(),
            total_workers: self.workers.len(),
            errors,
            elapsed: start_time.elapsed(),
        }
    }
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Directories listed
    pub dirs: u64,

    /// CSV files processed
    pub files: u64,

    /// Valid rows so far
    pub valid_rows: u64,

    /// Skipped rows so far
    pub skipped_rows: u64,

    /// Current queue size
    pub queue_size: usize,

    /// Active workers
    pub active_workers: usize,

    /// Total workers
    pub total_workers: usize,

    /// Errors encountered
    pub errors: u64,

    /// Elapsed time
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate rows per second rate (valid and skipped combined)
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.valid_rows + self.skipped_rows) as f64 / secs
        } else {
            0.0
        }
    }

    /// Calculate files per second rate
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files as f64 / secs
        } else {
            0.0
        }
    }
}
