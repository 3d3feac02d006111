//! Property tests for the merge-diff
//!
//! Random sets of paths are loaded into in-memory backends and diffed. The
//! "missing" lines must be exactly the complement of each backend within the
//! union of all paths, and the merge must visit every distinct path once.

use proptest::prelude::*;
use snapdiff::engine::{diff, DiffOptions};
use snapdiff::entry::{FsEntry, XattrValue};
use snapdiff::report::{CollectingReporter, Divergence};
use snapdiff::source::{Backend, MemoryBackend};
use std::collections::BTreeSet;

const URIS: [&str; 4] = ["A", "B", "C", "D"];

// Short paths over a tiny alphabet so backends overlap often
fn path_strategy() -> impl Strategy<Value = String> {
    "/[ab-]{1,3}(/[ab]{1,2})?"
}

fn snapshot_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(path_strategy(), 0..12)
}

fn snapshots_strategy() -> impl Strategy<Value = Vec<BTreeSet<String>>> {
    prop::collection::vec(snapshot_strategy(), 2..=4)
}

fn backends(snapshots: &[BTreeSet<String>]) -> Vec<MemoryBackend> {
    snapshots
        .iter()
        .map(|paths| {
            // Entries are handed over unsorted; the stream sorts them
            MemoryBackend::new(paths.iter().rev().map(|p| FsEntry::new(p.as_str(), 0o100644)).collect())
        })
        .collect()
}

fn run(backends: &[MemoryBackend], options: DiffOptions) -> (Vec<Divergence>, u64) {
    let refs: Vec<&dyn Backend> = backends.iter().map(|b| b as &dyn Backend).collect();
    let mut reporter = CollectingReporter::new();
    let stats = diff(&URIS[..backends.len()], &refs, options, &mut reporter).unwrap();
    (reporter.into_divergences(), stats.rounds)
}

proptest! {
    /// Every backend lacking a path gets exactly one missing line for it
    #[test]
    fn prop_missing_is_complement_of_union(snapshots in snapshots_strategy()) {
        let (found, rounds) = run(&backends(&snapshots), DiffOptions::default());

        let union: BTreeSet<&String> = snapshots.iter().flatten().collect();
        let mut expected = Vec::new();
        for path in &union {
            for (i, paths) in snapshots.iter().enumerate() {
                if !paths.contains(*path) {
                    expected.push((URIS[i].to_string(), (*path).clone()));
                }
            }
        }

        let actual: Vec<(String, String)> = found
            .iter()
            .map(|d| match d {
                Divergence::Missing { uri, path } => (uri.clone(), path.clone()),
                other => panic!("unexpected divergence {:?}", other),
            })
            .collect();

        // Same content and same order: ascending path, then backend index
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(rounds, union.len() as u64);
    }

    /// The merge never takes more rounds than there are entries
    #[test]
    fn prop_terminates_within_total_entries(snapshots in snapshots_strategy()) {
        let total: usize = snapshots.iter().map(BTreeSet::len).sum();
        let (_, rounds) = run(&backends(&snapshots), DiffOptions::default());

        prop_assert!(rounds as usize <= total);
        if total == 0 {
            prop_assert_eq!(rounds, 0);
        }
    }

    /// Identical snapshots never diverge, whatever their content
    #[test]
    fn prop_identical_snapshots_are_clean(
        paths in snapshot_strategy(),
        copies in 2usize..=4,
        hash in "[0-9a-f]{8}",
    ) {
        let entries: Vec<FsEntry> = paths
            .iter()
            .map(|p| FsEntry::new(p.as_str(), 0o100644).with_xattr("user.hash", XattrValue::String(hash.clone())))
            .collect();
        let backends: Vec<MemoryBackend> = (0..copies).map(|_| MemoryBackend::new(entries.clone())).collect();

        let options = DiffOptions { checksum: true, ..Default::default() };
        let (found, rounds) = run(&backends, options);
        prop_assert!(found.is_empty());
        prop_assert_eq!(rounds, paths.len() as u64);
    }

    /// Checksums of the wrong type are always reported as invalid
    #[test]
    fn prop_wrong_checksum_type_is_invalid(value in any::<u64>(), other in "[a-z]{1,6}") {
        let a = MemoryBackend::new(vec![
            FsEntry::new("/f", 0o100644).with_xattr("user.hash", XattrValue::UInt64(value)),
        ]);
        let b = MemoryBackend::new(vec![
            FsEntry::new("/f", 0o100644).with_xattr("user.hash", XattrValue::String(other)),
        ]);

        let options = DiffOptions { checksum: true, ..Default::default() };
        let (found, _) = run(&[a, b], options);
        prop_assert_eq!(
            found,
            vec![Divergence::InvalidChecksum { uri: "A".into(), path: "/f".into() }]
        );
    }

    /// Every stream is released exactly once
    #[test]
    fn prop_streams_released(snapshots in snapshots_strategy()) {
        let backends = backends(&snapshots);
        run(&backends, DiffOptions::default());

        for backend in &backends {
            let counters = backend.counters();
            prop_assert_eq!(counters.opened(), 1);
            prop_assert_eq!(counters.released(), 1);
        }
    }
}
