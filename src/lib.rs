//! csv-harvester - Parallel CustomerData CSV merger
//!
//! A tool that recursively scans a directory tree for CSV files matching
//! `CustomerData*.csv`, validates and normalizes each data row, tags rows
//! with a date derived from their directory path, and merges valid rows
//! into a single shared output file.
//!
//! # Features
//!
//! - **Parallel Scanning**: A pool of worker threads fans out one task per
//!   subdirectory and one per matching file, fed by a bounded work queue
//!   with inline fallback under backpressure.
//!
//! - **Row Validation**: Rows with fewer than 10 fields or any blank field
//!   are skipped; valid rows are normalized and date-tagged. Run-wide
//!   valid/skipped tallies use lock-free atomic counters.
//!
//! - **Serialized Output**: All batches funnel through a single writer
//!   thread, so concurrently finishing files never corrupt each other's
//!   lines. The header is written before any worker starts.
//!
//! - **Fault Isolation**: An unreadable directory or malformed file is
//!   logged and contributes nothing; sibling work is never affected.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Directory Tree                               │
//! │        root/2023/10/05/CustomerData*.csv ...                     │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ read_dir / csv reader
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Worker Threads                              │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │            │            │                    │          │
//! │       └────────────┼────────────┼────────────────────┘          │
//! │                    ▼            ▼                               │
//! │            ┌──────────────────────────┐                         │
//! │            │      Work Queue          │                         │
//! │            │  (crossbeam bounded)     │                         │
//! │            │  - inline on full        │                         │
//! │            └──────────────────────────┘                         │
//! │                         │ row batches                           │
//! │                         ▼                                       │
//! │            ┌──────────────────────────┐                         │
//! │            │    Output Writer         │                         │
//! │            │  - one thread, one file  │                         │
//! │            │  - contiguous batches    │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────┐
//!                    │   output.csv     │
//!                    │   harvest.log    │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Basic scan
//! csv-harvester ./sample-data -o output.csv -l harvest.log
//!
//! # High parallelism, quiet
//! csv-harvester /data/exports -w 16 -q
//! ```

pub mod config;
pub mod counters;
pub mod error;
pub mod progress;
pub mod sink;
pub mod summary;
pub mod validator;
pub mod walker;

pub use config::{CliArgs, HarvestConfig};
pub use counters::RowCounters;
pub use error::{HarvestError, Result};
pub use sink::{OutputSink, OUTPUT_HEADER};
pub use summary::RunLogger;
pub use walker::{ScanCoordinator, ScanProgress, ScanResult};
