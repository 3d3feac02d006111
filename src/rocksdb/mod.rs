//! RocksDB snapshot storage
//!
//! An alternative snapshot store behind the `rocksdb` feature. Entries live
//! in one column family keyed by path and are bincode-encoded, so a snapshot
//! is read back with a single forward scan.
//!
//! # Module Structure
//!
//! - `schema`: Column families, key encoding, RocksEntry struct
//! - `writer`: Batched snapshot writer
//! - `reader`: Read-only backend serving path-ordered streams

pub mod reader;
pub mod schema;
pub mod writer;

pub use reader::RocksBackend;
pub use schema::{meta_keys, RocksEntry, RocksHandle};
pub use writer::{RocksWriter, RocksWriterConfig};
