//! One-entry lookahead over an entry stream

use crate::entry::FsEntry;
use crate::error::SourceResult;
use crate::source::EntryStream;
use tracing::debug;

/// Wraps one stream with its current entry and an exhausted flag
///
/// Once primed, `current` is `None` exactly when the stream has ended.
pub struct StreamCursor<'a> {
    uri: String,
    stream: Box<dyn EntryStream + 'a>,
    current: Option<FsEntry>,
    ended: bool,
}

impl<'a> StreamCursor<'a> {
    /// Wrap an opened stream; call [`advance`](Self::advance) once to prime it
    pub fn new(uri: impl Into<String>, stream: Box<dyn EntryStream + 'a>) -> Self {
        Self {
            uri: uri.into(),
            stream,
            current: None,
            ended: false,
        }
    }

    /// Replace the current entry with the next one from the stream
    ///
    /// Returns whether an entry was read. An ended cursor is not fetched again.
    pub fn advance(&mut self) -> SourceResult<bool> {
        if self.ended {
            return Ok(false);
        }

        self.current = self.stream.fetch_next()?;
        if self.current.is_none() {
            self.ended = true;
            debug!(uri = %self.uri, "Entry stream exhausted");
        }
        Ok(self.current.is_some())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn current(&self) -> Option<&FsEntry> {
        self.current.as_ref()
    }

    /// Path of the current entry, `None` once ended
    pub fn path(&self) -> Option<&str> {
        self.current.as_ref().map(|e| e.path.as_str())
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl Drop for StreamCursor<'_> {
    fn drop(&mut self) {
        debug!(uri = %self.uri, ended = self.ended, "Releasing entry stream");
    }
}
