//! In-memory backend
//!
//! Holds its entries in a vector and sorts them by path when a stream is
//! opened. Primarily for testing: it can be told to refuse stream opens or to
//! fail after a number of fetches, and it counts how many of its streams are
//! still alive so callers can check that every stream was released.

use crate::entry::FsEntry;
use crate::error::{SourceError, SourceResult};
use crate::source::{require_path_ascending, Backend, Capabilities, EntryStream, SortSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stream bookkeeping shared between a backend and its streams
#[derive(Debug, Default)]
pub struct StreamCounters {
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl StreamCounters {
    /// Streams handed out so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams dropped so far
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Streams currently alive
    pub fn live(&self) -> usize {
        self.opened() - self.released()
    }
}

/// Backend serving entries from memory
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entries: Vec<FsEntry>,
    capabilities: Capabilities,
    fail_open: Option<String>,
    fail_after: Option<usize>,
    counters: Arc<StreamCounters>,
}

impl MemoryBackend {
    /// Create a backend over the given entries (any order)
    pub fn new(entries: Vec<FsEntry>) -> Self {
        Self {
            entries,
            capabilities: Capabilities::FILTER,
            fail_open: None,
            fail_after: None,
            counters: Arc::new(StreamCounters::default()),
        }
    }

    /// Override the advertised capabilities
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Make every `open_stream` call fail with this reason
    pub fn failing_open(mut self, reason: impl Into<String>) -> Self {
        self.fail_open = Some(reason.into());
        self
    }

    /// Make streams fail once `fetches` entries have been served
    pub fn failing_after(mut self, fetches: usize) -> Self {
        self.fail_after = Some(fetches);
        self
    }

    /// Shared stream counters
    pub fn counters(&self) -> Arc<StreamCounters> {
        Arc::clone(&self.counters)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn open_stream(&self, sort: &SortSpec) -> SourceResult<Box<dyn EntryStream + '_>> {
        require_path_ascending(sort)?;
        if let Some(reason) = &self.fail_open {
            return Err(SourceError::Open(reason.clone()));
        }

        let mut order: Vec<&FsEntry> = self.entries.iter().collect();
        order.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStream {
            order,
            next: 0,
            fail_after: self.fail_after,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MemoryStream<'a> {
    order: Vec<&'a FsEntry>,
    next: usize,
    fail_after: Option<usize>,
    counters: Arc<StreamCounters>,
}

impl EntryStream for MemoryStream<'_> {
    fn fetch_next(&mut self) -> SourceResult<Option<FsEntry>> {
        if self.fail_after.is_some_and(|limit| self.next >= limit) {
            return Err(SourceError::Fetch(format!(
                "injected failure after {} entries",
                self.next
            )));
        }

        let entry = self.order.get(self.next).map(|e| (*e).clone());
        if entry.is_some() {
            self.next += 1;
        }
        Ok(entry)
    }
}

impl Drop for MemoryStream<'_> {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(stream: &mut dyn EntryStream) -> Vec<String> {
        let mut paths = Vec::new();
        while let Some(entry) = stream.fetch_next().unwrap() {
            paths.push(entry.path);
        }
        paths
    }

    #[test]
    fn test_stream_is_path_ordered() {
        let backend = MemoryBackend::new(vec![
            FsEntry::new("/b", 0o100644),
            FsEntry::new("/a/z", 0o100644),
            FsEntry::new("/a", 0o040755),
        ]);

        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert_eq!(drain(stream.as_mut()), vec!["/a", "/a/z", "/b"]);

        // Exhausted streams keep returning None
        assert!(stream.fetch_next().unwrap().is_none());
    }

    #[test]
    fn test_each_open_restarts() {
        let backend = MemoryBackend::new(vec![FsEntry::new("/a", 0o100644)]);

        let mut first = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert_eq!(drain(first.as_mut()), vec!["/a"]);

        let mut second = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert_eq!(drain(second.as_mut()), vec!["/a"]);
    }

    #[test]
    fn test_release_counting() {
        let backend = MemoryBackend::new(vec![]);
        let counters = backend.counters();

        let stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert_eq!(counters.live(), 1);
        drop(stream);
        assert_eq!(counters.opened(), 1);
        assert_eq!(counters.released(), 1);
    }

    #[test]
    fn test_descending_sort_rejected() {
        let backend = MemoryBackend::new(vec![]);
        let sort = SortSpec {
            ascending: false,
            ..SortSpec::by_path()
        };
        assert!(matches!(
            backend.open_stream(&sort),
            Err(SourceError::UnsupportedSort(_))
        ));
    }

    #[test]
    fn test_injected_failures() {
        let backend = MemoryBackend::new(vec![]).failing_open("offline");
        assert!(matches!(
            backend.open_stream(&SortSpec::by_path()),
            Err(SourceError::Open(_))
        ));

        let backend = MemoryBackend::new(vec![
            FsEntry::new("/a", 0o100644),
            FsEntry::new("/b", 0o100644),
        ])
        .failing_after(1);
        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert!(stream.fetch_next().unwrap().is_some());
        assert!(matches!(stream.fetch_next(), Err(SourceError::Fetch(_))));
    }
}
