//! SQLite snapshot storage
//!
//! A snapshot is a SQLite database with one row per filesystem entry and one
//! row per extended attribute. This module writes snapshots and serves them
//! back as a path-ordered entry stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               SnapshotWriter                        │
//! │  - Buffers entries, one transaction per batch       │
//! │  - Indexes + ANALYZE on finish                      │
//! └─────────────────────┬───────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │   snapshot.db: entries / xattrs / snapshot_info     │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ SELECT ... WHERE path > ? ORDER BY path LIMIT n
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │               SqliteBackend / stream                │
//! │  - Read-only connection                             │
//! │  - One page buffered per open stream                │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod reader;
pub mod schema;
pub mod writer;

pub use reader::{SqliteBackend, DEFAULT_PAGE_SIZE};
pub use schema::{create_database, create_indexes, keys, optimize_for_reads};
pub use writer::{SnapshotWriter, WriterStats, DEFAULT_BATCH_SIZE};
