//! N-way streaming merge-diff
//!
//! Every backend hands out a stream of entries in ascending path order. The
//! engine keeps exactly one entry per stream and, each round, processes the
//! smallest path among them:
//!
//! ```text
//!   ROUND_START ── select_min_group ──► empty? ──► DONE (streams released)
//!        ▲                                 │
//!        │                                 ▼
//!     ADVANCE ◄── check mode/checksums ◄── REPORT missing for non-members
//!   (members only)
//! ```
//!
//! Memory stays proportional to the number of backends, never to snapshot
//! size. Every round advances at least one stream, so a diff takes at most as
//! many rounds as there are entries in total.

pub mod compare;
pub mod cursor;
pub mod select;
pub mod set;

pub use compare::{check_checksums, check_mode, GroupMember};
pub use cursor::StreamCursor;
pub use select::{select_min_group, MinGroup};
pub use set::StreamSet;

use crate::backend::OpenedBackend;
use crate::config::{DiffConfig, DEFAULT_CHECKSUM_XATTR};
use crate::error::Result;
use crate::report::{DiffReporter, Divergence};
use crate::source::{Backend, SortSpec};
use std::time::{Duration, Instant};
use tracing::info;

/// Default number of rounds between progress callbacks
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// What the engine compares beyond presence
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Compare checksum attributes of regular files
    pub checksum: bool,

    /// Attribute holding the checksum
    pub checksum_xattr: String,

    /// Rounds between progress callbacks
    pub progress_interval: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            checksum: false,
            checksum_xattr: DEFAULT_CHECKSUM_XATTR.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl DiffOptions {
    pub fn from_config(config: &DiffConfig) -> Self {
        Self {
            checksum: config.checksum,
            checksum_xattr: config.checksum_xattr.clone(),
            ..Default::default()
        }
    }
}

/// Counters for a diff run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    /// Distinct paths processed
    pub rounds: u64,

    /// Entries fetched across all streams
    pub entries_read: u64,

    /// Largest min-group seen
    pub max_group: usize,

    pub missing: u64,
    pub mode_mismatches: u64,
    pub invalid_checksums: u64,
    pub missing_checksums: u64,
    pub checksum_mismatches: u64,

    /// Wall time, set when the run finishes
    pub duration: Duration,
}

impl DiffStats {
    /// Total divergences reported
    pub fn divergences(&self) -> u64 {
        self.missing
            + self.mode_mismatches
            + self.invalid_checksums
            + self.missing_checksums
            + self.checksum_mismatches
    }

    /// True when the snapshots agree on everything compared
    pub fn is_clean(&self) -> bool {
        self.divergences() == 0
    }

    /// Rounds per second
    pub fn rounds_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.rounds as f64 / secs
        } else {
            0.0
        }
    }

    fn record(&mut self, divergence: &Divergence) {
        match divergence {
            Divergence::Missing { .. } => self.missing += 1,
            Divergence::ModeMismatch { .. } => self.mode_mismatches += 1,
            Divergence::InvalidChecksum { .. } => self.invalid_checksums += 1,
            Divergence::MissingChecksum { .. } => self.missing_checksums += 1,
            Divergence::ChecksumMismatch { .. } => self.checksum_mismatches += 1,
        }
    }
}

/// Merge-diff over an opened stream set
pub struct DiffEngine<'a> {
    set: StreamSet<'a>,
    options: DiffOptions,
}

impl<'a> DiffEngine<'a> {
    /// Open and prime one stream per backend
    pub fn open<U: AsRef<str>>(
        uris: &[U],
        backends: &[&'a dyn Backend],
        options: DiffOptions,
    ) -> Result<Self> {
        let set = StreamSet::open(uris, backends, &SortSpec::by_path())?;
        Ok(Self { set, options })
    }

    /// Open streams over backends from [`crate::backend::open_backends`]
    pub fn from_backends(opened: &'a [OpenedBackend], options: DiffOptions) -> Result<Self> {
        let uris: Vec<&str> = opened.iter().map(|o| o.uri.raw.as_str()).collect();
        let backends: Vec<&'a dyn Backend> = opened
            .iter()
            .map(|o| -> &'a dyn Backend { &*o.backend })
            .collect();
        Self::open(&uris, &backends, options)
    }

    /// Run the diff to completion
    pub fn run<R: DiffReporter + ?Sized>(self, reporter: &mut R) -> Result<DiffStats> {
        self.run_with_progress(reporter, |_| {})
    }

    /// Run the diff, calling `progress` every `progress_interval` rounds
    ///
    /// Streams are released when this returns, whether or not it succeeded.
    pub fn run_with_progress<R, F>(mut self, reporter: &mut R, mut progress: F) -> Result<DiffStats>
    where
        R: DiffReporter + ?Sized,
        F: FnMut(&DiffStats),
    {
        let start = Instant::now();
        let mut stats = DiffStats::default();
        let interval = self.options.progress_interval.max(1);

        info!(
            streams = self.set.len(),
            checksum = self.options.checksum,
            "Starting diff"
        );

        loop {
            let group = self.set.select();
            if group.is_empty() {
                break;
            }
            stats.rounds += 1;
            stats.max_group = stats.max_group.max(group.count());

            for divergence in self.round_divergences(&group) {
                stats.record(&divergence);
                reporter.report(&divergence)?;
            }

            self.set.advance(&group)?;
            stats.entries_read = self.set.entries_read();

            if stats.rounds % interval == 0 {
                progress(&stats);
            }
        }

        reporter.finish()?;
        stats.entries_read = self.set.entries_read();
        stats.duration = start.elapsed();

        info!(
            rounds = stats.rounds,
            entries = stats.entries_read,
            divergences = stats.divergences(),
            elapsed_ms = stats.duration.as_millis() as u64,
            "Diff complete"
        );

        Ok(stats)
    }

    /// Everything to report for one group, in emission order
    fn round_divergences(&self, group: &MinGroup) -> Vec<Divergence> {
        let members = self.set.members(group);
        let Some(first) = members.first() else {
            return Vec::new();
        };
        let path = first.entry.path.as_str();

        let mut found: Vec<Divergence> = group
            .non_members()
            .filter_map(|i| self.set.cursor(i))
            .map(|cursor| Divergence::Missing {
                uri: cursor.uri().to_string(),
                path: path.to_string(),
            })
            .collect();

        if let Some(mismatch) = check_mode(path, &members) {
            found.push(mismatch);
        } else if self.options.checksum {
            found.extend(check_checksums(path, &members, &self.options.checksum_xattr));
        }

        found
    }
}

/// Diff the given backends in one call
pub fn diff<R: DiffReporter + ?Sized>(
    uris: &[&str],
    backends: &[&dyn Backend],
    options: DiffOptions,
    reporter: &mut R,
) -> Result<DiffStats> {
    DiffEngine::open(uris, backends, options)?.run(reporter)
}
