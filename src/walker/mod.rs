//! Parallel directory tree scanner
//!
//! This module implements the concurrent tree walk: a bounded work queue
//! carries one task per directory and one per matching CSV file, a pool of
//! workers fans the tree out, and a coordinator provides the completion
//! barrier that gates the run summary.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │     ScanCoordinator      │
//!                  │  - seeds root task       │
//!                  │  - completion barrier    │
//!                  └────────────┬─────────────┘
//!                               │
//!                  ┌────────────▼─────────────┐
//!                  │        ScanQueue         │
//!                  │   (crossbeam bounded)    │
//!                  │  Dir + File tasks        │
//!                  └────────────┬─────────────┘
//!          ┌────────────────────┼────────────────────┐
//!    ┌─────▼─────┐        ┌─────▼─────┐        ┌─────▼─────┐
//!    │  Worker 1 │        │  Worker 2 │  ...   │  Worker N │
//!    │  list dir │        │  validate │        │  validate │
//!    └─────┬─────┘        └─────┬─────┘        └─────┬─────┘
//!          └────────────────────┼────────────────────┘
//!                               │ batches
//!                  ┌────────────▼─────────────┐
//!                  │        OutputSink        │
//!                  │  (single writer thread)  │
//!                  └──────────────────────────┘
//! ```

pub mod coordinator;
pub mod queue;
pub mod worker;

pub use coordinator::{ScanCoordinator, ScanProgress, ScanResult};
pub use queue::{DirTask, FileTask, ScanQueue, ScanTask};
pub use worker::Worker;
