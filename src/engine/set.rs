//! The set of cursors taking part in a diff
//!
//! Streams are acquired in input order and released in reverse order. The
//! set is built up in place, so a failure while opening or priming drops
//! whatever was acquired so far through the same path as a normal exit.

use crate::engine::compare::GroupMember;
use crate::engine::cursor::StreamCursor;
use crate::engine::select::{select_min_group, MinGroup};
use crate::error::{DiffError, Result};
use crate::source::{Backend, SortSpec};
use tracing::debug;

/// Cursors index-aligned with the compared URIs
pub struct StreamSet<'a> {
    cursors: Vec<StreamCursor<'a>>,
    entries_read: u64,
}

impl<'a> StreamSet<'a> {
    /// Open one stream per backend, then prime every stream
    ///
    /// On failure every stream opened so far is released before the error is
    /// returned.
    pub fn open<U: AsRef<str>>(
        uris: &[U],
        backends: &[&'a dyn Backend],
        sort: &SortSpec,
    ) -> Result<Self> {
        if uris.len() != backends.len() {
            return Err(DiffError::Arity {
                uris: uris.len(),
                backends: backends.len(),
            });
        }

        let mut set = Self {
            cursors: Vec::with_capacity(backends.len()),
            entries_read: 0,
        };

        for (uri, &backend) in uris.iter().zip(backends) {
            let uri = uri.as_ref();
            let stream = backend
                .open_stream(sort)
                .map_err(|e| DiffError::read_failed(uri, e))?;
            debug!(uri, backend = backend.name(), "Opened entry stream");
            set.cursors.push(StreamCursor::new(uri, stream));
        }

        for cursor in &mut set.cursors {
            if cursor
                .advance()
                .map_err(|e| DiffError::read_failed(cursor.uri(), e))?
            {
                set.entries_read += 1;
            }
            debug!(uri = cursor.uri(), ended = cursor.is_ended(), "Primed entry stream");
        }

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn cursor(&self, index: usize) -> Option<&StreamCursor<'a>> {
        self.cursors.get(index)
    }

    /// Entries fetched so far across all streams
    pub fn entries_read(&self) -> u64 {
        self.entries_read
    }

    /// Find the cursors holding the smallest current path
    pub fn select(&self) -> MinGroup {
        select_min_group(self.cursors.iter().map(|c| c.path()))
    }

    /// Entries of the group members, in index order
    pub fn members(&self, group: &MinGroup) -> Vec<GroupMember<'_>> {
        group
            .members()
            .filter_map(|i| {
                let cursor = &self.cursors[i];
                cursor.current().map(|entry| GroupMember {
                    uri: cursor.uri(),
                    entry,
                })
            })
            .collect()
    }

    /// Fetch the next entry for every group member
    pub fn advance(&mut self, group: &MinGroup) -> Result<()> {
        for i in group.members() {
            let cursor = &mut self.cursors[i];
            if cursor
                .advance()
                .map_err(|e| DiffError::read_failed(cursor.uri(), e))?
            {
                self.entries_read += 1;
            }
        }
        Ok(())
    }
}

impl Drop for StreamSet<'_> {
    fn drop(&mut self) {
        while let Some(cursor) = self.cursors.pop() {
            drop(cursor);
        }
    }
}
