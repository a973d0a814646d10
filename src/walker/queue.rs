//! Work queue with backpressure support
//!
//! This module provides a bounded queue of scan tasks: one task per
//! directory and one per matching CSV file. When the queue is full the
//! submitting worker processes the task inline instead of blocking, so no
//! task is ever dropped and memory stays bounded on deep/wide trees.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// A task to list a directory
#[derive(Debug, Clone)]
pub struct DirTask {
    /// Full path to the directory
    pub path: PathBuf,

    /// Depth from root (0 = root)
    pub depth: u32,
}

impl DirTask {
    /// Create a new directory task
    pub fn new(path: PathBuf, depth: u32) -> Self {
        Self { path, depth }
    }

    /// Create the root task
    pub fn root(path: PathBuf) -> Self {
        Self { path, depth: 0 }
    }
}

/// A task to validate one matching CSV file
#[derive(Debug, Clone)]
pub struct FileTask {
    /// Full path to the file
    pub path: PathBuf,

    /// Date tag derived from the containing directory, shared by all of
    /// that directory's files
    pub date: Arc<str>,
}

/// A unit of scan work
#[derive(Debug, Clone)]
pub enum ScanTask {
    /// List a directory and fan out its children
    Dir(DirTask),

    /// Validate one CSV file
    File(FileTask),
}

impl ScanTask {
    /// Path this task operates on
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanTask::Dir(task) => &task.path,
            ScanTask::File(task) => &task.path,
        }
    }
}

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks enqueued
    pub enqueued: AtomicU64,

    /// Total tasks dequeued
    pub dequeued: AtomicU64,

    /// Tasks processed inline due to backpressure
    pub inline_processed: AtomicU64,
}

impl QueueStats {
    /// Get number of inline-processed tasks
    pub fn inline_count(&self) -> u64 {
        self.inline_processed.load(Ordering::Relaxed)
    }
}

/// Bounded queue of scan tasks
pub struct ScanQueue {
    /// Sender for adding tasks
    sender: Sender<ScanTask>,

    /// Receiver for getting tasks
    receiver: Receiver<ScanTask>,

    /// Queue capacity
    capacity: usize,

    /// Tasks enqueued but not yet fully processed. A task counts from the
    /// moment it is accepted by the queue until the worker that dequeued it
    /// has finished running it, children included.
    pending: Arc<AtomicU64>,

    /// Number of active workers
    active_workers: Arc<AtomicUsize>,

    /// Queue statistics
    stats: Arc<QueueStats>,
}

impl ScanQueue {
    /// Create a new work queue with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            capacity,
            pending: Arc::new(AtomicU64::new(0)),
            active_workers: Arc::new(AtomicUsize::new(0)),
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get a sender for this queue (clone for each worker)
    pub fn sender(&self) -> ScanQueueSender {
        ScanQueueSender {
            sender: self.sender.clone(),
            pending: Arc::clone(&self.pending),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get a receiver for this queue (clone for each worker)
    pub fn receiver(&self) -> ScanQueueReceiver {
        ScanQueueReceiver {
            receiver: self.receiver.clone(),
            pending: Arc::clone(&self.pending),
            active_workers: Arc::clone(&self.active_workers),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of currently active workers
    pub fn active_worker_count(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    /// Seed the queue with the root directory
    pub fn seed(&self, root: PathBuf) -> Result<(), TrySendError<ScanTask>> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.sender.try_send(ScanTask::Dir(DirTask::root(root))) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Check if all work is complete
    ///
    /// A task stays pending from enqueue until the worker that dequeued it
    /// calls [`ScanQueueReceiver::task_done`], and a child is counted
    /// before its parent's decrement. A dequeued-but-unstarted task can
    /// therefore never make the walk look finished, and a zero reading is
    /// final: nothing is queued, nothing is in flight, and no worker can
    /// produce new work.
    pub fn is_complete(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }
}

/// Handle for sending tasks to the queue
#[derive(Clone)]
pub struct ScanQueueSender {
    sender: Sender<ScanTask>,
    pending: Arc<AtomicU64>,
    stats: Arc<QueueStats>,
}

impl ScanQueueSender {
    /// Try to send a task to the queue
    ///
    /// On a full or disconnected queue the task is handed back inside the
    /// error so the caller can process it inline - it must not be dropped.
    /// Inline tasks never count as pending; they run to completion inside
    /// their parent task, which is still pending itself.
    pub fn try_send(&self, task: ScanTask) -> Result<(), TrySendError<ScanTask>> {
        // Increment first so the count can never be observed at zero while
        // the task is in the channel
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.sender.try_send(task) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Record that a task was processed inline (for stats)
    pub fn record_inline(&self) {
        self.stats.inline_processed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Handle for receiving tasks from the queue
#[derive(Clone)]
pub struct ScanQueueReceiver {
    receiver: Receiver<ScanTask>,
    pending: Arc<AtomicU64>,
    active_workers: Arc<AtomicUsize>,
    stats: Arc<QueueStats>,
}

impl ScanQueueReceiver {
    /// Try to receive a task without blocking
    pub fn try_recv(&self) -> Option<ScanTask> {
        match self.receiver.try_recv() {
            Ok(task) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(task)
            }
            Err(_) => None,
        }
    }

    /// Receive with timeout
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<ScanTask> {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(task)
            }
            Err(_) => None,
        }
    }

    /// Mark one dequeued task as fully processed. Must be called after any
    /// children have been enqueued, so the pending count never dips to zero
    /// while work remains.
    pub fn task_done(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Mark this worker as active
    pub fn begin_work(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark this worker as idle
    pub fn end_work(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

/// RAII guard for marking work as active
pub struct WorkGuard<'a> {
    receiver: &'a ScanQueueReceiver,
}

impl<'a> WorkGuard<'a> {
    /// Create a new work guard (marks worker as active)
    pub fn new(receiver: &'a ScanQueueReceiver) -> Self {
        receiver.begin_work();
        Self { receiver }
    }
}

impl<'a> Drop for WorkGuard<'a> {
    fn drop(&mut self) {
        self.receiver.end_work();
    }
}
