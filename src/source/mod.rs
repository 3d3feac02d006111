//! Entry sources
//!
//! A [`Backend`] is an opened snapshot store. Asked with a [`SortSpec`], it
//! hands out an [`EntryStream`]: a lazy sequence of [`FsEntry`] values in
//! ascending path order. Each call to `open_stream` starts a fresh pass.
//!
//! Releasing a stream is dropping it. Every concrete stream frees its
//! underlying iteration resource (prepared query, RocksDB iterator, ...) in
//! `Drop`, so ownership guarantees the resource is released exactly once.
//!
//! # Backends
//!
//! | Scheme    | Type                    | Notes                          |
//! |-----------|-------------------------|--------------------------------|
//! | `sqlite`  | [`crate::db::SqliteBackend`] | SQLite snapshot database  |
//! | `rocksdb` | `crate::rocksdb::RocksBackend` | `rocksdb` feature only  |
//! | -         | [`MemoryBackend`]       | in-process, used by tests      |

pub mod memory;

pub use memory::MemoryBackend;

use crate::entry::FsEntry;
use crate::error::SourceResult;

/// Field an entry stream is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Full path, compared byte-wise
    Path,
}

/// Ordering requested when opening a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub ascending: bool,
}

impl SortSpec {
    /// Ascending by full path, the order the merge relies on
    pub const fn by_path() -> Self {
        Self {
            key: SortKey::Path,
            ascending: true,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::by_path()
    }
}

/// What a backend can do beyond plain iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Entries can be filtered and sorted server-side
    pub filter: bool,
}

impl Capabilities {
    pub const FILTER: Self = Self { filter: true };
    pub const NONE: Self = Self { filter: false };
}

/// A lazy, path-ordered sequence of filesystem entries
pub trait EntryStream {
    /// Fetch the next entry; `Ok(None)` is a clean end of stream
    fn fetch_next(&mut self) -> SourceResult<Option<FsEntry>>;
}

impl<S: EntryStream + ?Sized> EntryStream for Box<S> {
    fn fetch_next(&mut self) -> SourceResult<Option<FsEntry>> {
        (**self).fetch_next()
    }
}

/// An opened snapshot store
pub trait Backend {
    /// Backend kind, e.g. `"sqlite"`
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Start a new pass over the store's entries
    fn open_stream(&self, sort: &SortSpec) -> SourceResult<Box<dyn EntryStream + '_>>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn open_stream(&self, sort: &SortSpec) -> SourceResult<Box<dyn EntryStream + '_>> {
        (**self).open_stream(sort)
    }
}

/// Reject any ordering other than ascending by path
pub(crate) fn require_path_ascending(sort: &SortSpec) -> SourceResult<()> {
    if sort.key != SortKey::Path || !sort.ascending {
        return Err(crate::error::SourceError::UnsupportedSort(format!(
            "{:?} {}",
            sort.key,
            if sort.ascending { "ascending" } else { "descending" }
        )));
    }
    Ok(())
}
