//! Shared row counters for a harvest run
//!
//! One `RowCounters` instance is created per run, shared by every worker,
//! and read exactly once after all workers have joined. Updates are plain
//! atomic increments, so no lock is held on the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Run-wide tallies of classified rows
#[derive(Debug, Default)]
pub struct RowCounters {
    /// Rows that passed validation and were written to the output
    valid: AtomicU64,

    /// Rows rejected by validation
    skipped: AtomicU64,
}

impl RowCounters {
    /// Create zeroed counters for a new run
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one valid row
    pub fn record_valid(&self) {
        self.valid.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one skipped row
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Current valid row count
    pub fn valid(&self) -> u64 {
        self.valid.load(Ordering::Relaxed)
    }

    /// Current skipped row count
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Total classified rows
    pub fn total(&self) -> u64 {
        self.valid() + self.skipped()
    }
}
