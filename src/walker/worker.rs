//! Worker thread logic for the parallel tree scan
//!
//! Each worker:
//! - Pulls scan tasks from the shared work queue
//! - For a directory task: lists the directory, derives the date tag once,
//!   and fans out one task per subdirectory and one per matching CSV file
//! - For a file task: runs row validation and hands the batch to the sink
//! - Processes tasks inline when the queue is full, so nothing is dropped
//!
//! Directory and file failures are caught here, logged, and contribute
//! nothing - they never abort sibling work.

use crate::config::HarvestConfig;
use crate::counters::RowCounters;
use crate::error::{CsvError, ScanError, TaskOutcome, WorkerError};
use crate::sink::SinkHandle;
use crate::validator;
use crate::walker::queue::{
    DirTask, FileTask, ScanQueueReceiver, ScanQueueSender, ScanTask, WorkGuard,
};
use crossbeam_channel::TrySendError;
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Directories listed
    pub dirs_scanned: AtomicU64,

    /// CSV files processed
    pub files_processed: AtomicU64,

    /// Errors encountered
    pub errors: AtomicU64,

    /// Paths skipped (permission denied, vanished, etc.)
    pub skipped: AtomicU64,
}

impl WorkerStats {
    fn record_dir(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    fn record_file(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything a worker needs to process tasks, bundled so inline
/// (backpressure) processing can recurse without long argument lists
struct WorkerContext {
    id: usize,
    config: Arc<HarvestConfig>,
    queue_tx: ScanQueueSender,
    sink: SinkHandle,
    counters: Arc<RowCounters>,
    stats: Arc<WorkerStats>,
}

/// A worker thread that processes scan tasks
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        id: usize,
        config: Arc<HarvestConfig>,
        queue_rx: ScanQueueReceiver,
        queue_tx: ScanQueueSender,
        sink: SinkHandle,
        counters: Arc<RowCounters>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());

        let ctx = WorkerContext {
            id,
            config,
            queue_tx,
            sink,
            counters,
            stats: Arc::clone(&stats),
        };

        let handle = thread::Builder::new()
            .name(format!("harvester-{}", id))
            .spawn(move || worker_loop(&ctx, &queue_rx, &shutdown))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| WorkerError::Panicked { id: self.id })?;
        }
        Ok(())
    }
}

/// Main worker loop
fn worker_loop(ctx: &WorkerContext, queue_rx: &ScanQueueReceiver, shutdown: &AtomicBool) {
    debug!(worker = ctx.id, "Worker starting");

    while !shutdown.load(Ordering::Relaxed) {
        // Try to get a task with timeout so the shutdown flag is rechecked
        let task = match queue_rx.recv_timeout(Duration::from_millis(50)) {
            Some(task) => task,
            None => continue,
        };

        {
            // Active for the duration of the task, children included
            let _guard = WorkGuard::new(queue_rx);
            run_task(ctx, &task);
        }

        // The task counted as pending from enqueue until here, and any
        // children were enqueued inside run_task, so the completion check
        // can never fire while this worker holds work
        queue_rx.task_done();
    }

    info!(
        worker = ctx.id,
        dirs = ctx.stats.dirs_scanned.load(Ordering::Relaxed),
        files = ctx.stats.files_processed.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

/// Process one task and log its outcome
fn run_task(ctx: &WorkerContext, task: &ScanTask) {
    let outcome = match task {
        ScanTask::Dir(dir) => process_directory(ctx, dir),
        ScanTask::File(file) => process_csv_file(ctx, file),
    };

    match &outcome {
        TaskOutcome::DirListed {
            path,
            subdirs,
            files,
        } => {
            trace!(
                worker = ctx.id,
                path = %path.display(),
                subdirs = *subdirs,
                files = *files,
                "Directory listed"
            );
        }
        TaskOutcome::FileProcessed {
            path,
            valid,
            skipped,
        } => {
            debug!(
                worker = ctx.id,
                path = %path.display(),
                valid = *valid,
                skipped = *skipped,
                "File processed"
            );
        }
        TaskOutcome::Skipped { path, reason } => {
            debug!(worker = ctx.id, path = %path.display(), reason = %reason, "Path skipped");
        }
        TaskOutcome::Failed { path, error } => {
            warn!(worker = ctx.id, path = %path.display(), error = %error, "Task failed");
        }
    }
}

/// Hand a child task to the queue, falling back to inline processing when
/// the queue is full so the task is never lost
fn dispatch(ctx: &WorkerContext, task: ScanTask) {
    match ctx.queue_tx.try_send(task) {
        Ok(()) => {}
        Err(TrySendError::Full(task)) => {
            ctx.queue_tx.record_inline();
            trace!(worker = ctx.id, path = %task.path().display(), "Queue full - processing inline");
            run_task(ctx, &task);
        }
        Err(TrySendError::Disconnected(task)) => {
            // Queue torn down while work remains; process inline rather
            // than drop rows
            warn!(worker = ctx.id, path = %task.path().display(), "Queue disconnected - processing inline");
            run_task(ctx, &task);
        }
    }
}

/// List a single directory and fan out its children
///
/// A listing failure is caught at this subtree's scope and treated as an
/// empty subtree; sibling processing is unaffected.
fn process_directory(ctx: &WorkerContext, task: &DirTask) -> TaskOutcome {
    let entries = match fs::read_dir(&task.path) {
        Ok(entries) => entries,
        Err(e) => {
            let err = ScanError::from_io(&task.path, e);
            ctx.stats.record_error();

            if err.is_recoverable() {
                ctx.stats.record_skip();
                return TaskOutcome::Skipped {
                    path: task.path.clone(),
                    reason: err.to_string(),
                };
            }

            return TaskOutcome::Failed {
                path: task.path.clone(),
                error: err.into(),
            };
        }
    };

    // Derived once per directory and shared by all of its file tasks
    let date: Arc<str> = Arc::from(validator::derive_date(&task.path).as_str());

    let mut subdirs = 0;
    let mut files = 0;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                ctx.stats.record_error();
                warn!(worker = ctx.id, path = %task.path.display(), error = %e, "Failed to read directory entry");
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                ctx.stats.record_error();
                warn!(worker = ctx.id, path = %entry.path().display(), error = %e, "Failed to stat entry");
                continue;
            }
        };

        if file_type.is_dir() {
            subdirs += 1;
            dispatch(
                ctx,
                ScanTask::Dir(DirTask::new(entry.path(), task.depth + 1)),
            );
        } else if file_type.is_file() {
            let name = entry.file_name();
            let matches = name
                .to_str()
                .is_some_and(|n| ctx.config.is_candidate(n));

            if matches {
                files += 1;
                dispatch(
                    ctx,
                    ScanTask::File(FileTask {
                        path: entry.path(),
                        date: Arc::clone(&date),
                    }),
                );
            }
        }
    }

    ctx.stats.record_dir();

    TaskOutcome::DirListed {
        path: task.path.clone(),
        subdirs,
        files,
    }
}

/// Validate one CSV file and append its batch to the sink
///
/// File-level failures are caught here; the file contributes nothing and
/// the walk continues.
fn process_csv_file(ctx: &WorkerContext, task: &FileTask) -> TaskOutcome {
    let batch = match validator::process_file(&task.path, &task.date, &ctx.counters) {
        Ok(batch) => batch,
        Err(e) => {
            ctx.stats.record_error();
            return TaskOutcome::Failed {
                path: task.path.clone(),
                error: e.into(),
            };
        }
    };

    if let Some(e) = batch.parse_error {
        ctx.stats.record_error();
        let err = CsvError::Parse {
            path: task.path.clone(),
            source: e,
        };
        warn!(worker = ctx.id, error = %err, "Malformed record stopped file read early");
    }

    // A file with zero valid rows performs no sink call
    if !batch.lines.is_empty() {
        if let Err(e) = ctx.sink.append(batch.lines) {
            ctx.stats.record_error();
            error!(worker = ctx.id, path = %task.path.display(), error = %e, "Failed to append batch to output");
        }
    }

    ctx.stats.record_file();

    TaskOutcome::FileProcessed {
        path: task.path.clone(),
        valid: batch.valid,
        skipped: batch.skipped,
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker]) -> (u64, u64, u64, u64) {
    let mut dirs = 0u64;
    let mut files = 0u64;
    let mut errors = 0u64;
    let mut skipped = 0u64;

    for worker in workers {
        dirs += worker.stats.dirs_scanned.load(Ordering::Relaxed);
        files += worker.stats.files_processed.load(Ordering::Relaxed);
        errors += worker.stats.errors.load(Ordering::Relaxed);
        skipped += worker.stats.skipped.load(Ordering::Relaxed);
    }

    (dirs, files, errors, skipped)
}
