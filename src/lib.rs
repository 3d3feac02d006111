//! snapdiff - Filesystem Metadata Snapshot Diff
//!
//! Compares the filesystem metadata snapshots held by two or more backends
//! and reports where they diverge: entries missing from some backends, mode
//! mismatches, and (optionally) checksum extended attributes that disagree.
//!
//! # Features
//!
//! - **Streaming N-way merge**: Every snapshot is read as a path-ordered
//!   stream; only one entry per backend is held in memory at a time.
//!
//! - **Pluggable backends**: SQLite snapshots out of the box, RocksDB behind
//!   the `rocksdb` feature, and an in-memory backend for tests.
//!
//! - **Stable output**: Diff lines keep their historical wording; a revised
//!   wording and JSON lines are available on request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐        ┌──────────────┐
//! │  Backend 1   │  │  Backend 2   │  ...   │  Backend N   │
//! │ sqlite:a.db  │  │ sqlite:b.db  │        │ rocksdb:c    │
//! └──────┬───────┘  └──────┬───────┘        └──────┬───────┘
//!        │ path-ordered    │                       │
//!        ▼ stream          ▼                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      StreamSet                          │
//! │   one cursor per backend, released in reverse order     │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ select_min_group
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      DiffEngine                         │
//! │   missing entries / mode check / checksum check         │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ Divergence
//!                             ▼
//!                    ┌──────────────────┐
//!                    │   DiffReporter   │
//!                    │  (stdout lines)  │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Two snapshots
//! snapdiff sqlite:monday.db sqlite:tuesday.db
//!
//! # Three snapshots, with checksums
//! snapdiff --checksum sqlite:a.db sqlite:b.db sqlite:c.db
//! ```

pub mod backend;
pub mod config;
pub mod db;
pub mod engine;
pub mod entry;
pub mod error;
pub mod progress;
pub mod report;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;
pub mod source;

pub use config::{BackendUri, CliArgs, DiffConfig, ReportFormat};
pub use engine::{diff, DiffEngine, DiffOptions, DiffStats};
pub use entry::{EntryType, FsEntry, XattrValue};
pub use error::{DiffError, Result};
pub use report::{CollectingReporter, DiffReporter, Divergence, LineReporter};
pub use source::{Backend, EntryStream, MemoryBackend, SortSpec};
