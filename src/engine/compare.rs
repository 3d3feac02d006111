//! Entry comparison within a min-group
//!
//! All members of a group share a path. The first member's mode is the
//! reference; checksums are compared only when modes agree.

use crate::entry::{FsEntry, XattrValue};
use crate::report::Divergence;

/// One group member: the entry and the backend it came from
#[derive(Debug, Clone, Copy)]
pub struct GroupMember<'a> {
    pub uri: &'a str,
    pub entry: &'a FsEntry,
}

/// Report a mode mismatch if any member's mode differs from the first
pub fn check_mode(path: &str, members: &[GroupMember<'_>]) -> Option<Divergence> {
    let (first, rest) = members.split_first()?;
    rest.iter()
        .any(|m| m.entry.mode != first.entry.mode)
        .then(|| Divergence::ModeMismatch {
            path: path.to_string(),
        })
}

/// Check the checksum attribute of every regular-file member
///
/// Missing and invalid attributes are reported per backend. Well-typed
/// checksums are compared with the first one seen; any disagreement yields a
/// single mismatch, reported after the whole group has been scanned.
pub fn check_checksums(
    path: &str,
    members: &[GroupMember<'_>],
    xattr_name: &str,
) -> Vec<Divergence> {
    let mut found = Vec::new();
    let mut reference: Option<&XattrValue> = None;
    let mut mismatch = false;

    for member in members.iter().filter(|m| m.entry.is_regular_file()) {
        let value = match member.entry.xattr(xattr_name) {
            None => {
                found.push(Divergence::MissingChecksum {
                    uri: member.uri.to_string(),
                    path: path.to_string(),
                });
                continue;
            }
            Some(value) if !is_checksum_type(value) => {
                found.push(Divergence::InvalidChecksum {
                    uri: member.uri.to_string(),
                    path: path.to_string(),
                });
                continue;
            }
            Some(value) => value,
        };

        match reference {
            None => reference = Some(value),
            Some(first) => {
                if !checksums_equal(first, value) {
                    mismatch = true;
                }
            }
        }
    }

    if mismatch {
        found.push(Divergence::ChecksumMismatch {
            path: path.to_string(),
        });
    }
    found
}

/// Only strings and binary blobs can carry a checksum
pub fn is_checksum_type(value: &XattrValue) -> bool {
    matches!(value, XattrValue::String(_) | XattrValue::Binary(_))
}

/// Compare two well-typed checksums; a string never equals a binary
pub fn checksums_equal(a: &XattrValue, b: &XattrValue) -> bool {
    match (a, b) {
        (XattrValue::String(a), XattrValue::String(b)) => a.as_bytes() == b.as_bytes(),
        (XattrValue::Binary(a), XattrValue::Binary(b)) => a.len() == b.len() && a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XATTR: &str = "user.hash";

    fn file(mode: u32, hash: Option<XattrValue>) -> FsEntry {
        let entry = FsEntry::new("/f", mode);
        match hash {
            Some(value) => entry.with_xattr(XATTR, value),
            None => entry,
        }
    }

    fn members<'a>(entries: &'a [FsEntry], uris: &'a [&'a str]) -> Vec<GroupMember<'a>> {
        uris.iter()
            .zip(entries)
            .map(|(&uri, entry)| GroupMember { uri, entry })
            .collect()
    }

    fn text(s: &str) -> Option<XattrValue> {
        Some(XattrValue::String(s.to_string()))
    }

    #[test]
    fn test_mode_agreement() {
        let entries = [file(0o100644, None), file(0o100644, None)];
        assert_eq!(check_mode("/f", &members(&entries, &["A", "B"])), None);
    }

    #[test]
    fn test_mode_mismatch_reported_once() {
        let entries = [
            FsEntry::new("/d", 0o040755),
            FsEntry::new("/d", 0o040755),
            FsEntry::new("/d", 0o040777),
        ];
        assert_eq!(
            check_mode("/d", &members(&entries, &["A", "B", "C"])),
            Some(Divergence::ModeMismatch { path: "/d".into() })
        );
    }

    #[test]
    fn test_single_member_never_mismatches() {
        let entries = [file(0o100644, None)];
        assert_eq!(check_mode("/f", &members(&entries, &["A"])), None);
        assert_eq!(check_mode("/f", &[]), None);
    }

    #[test]
    fn test_missing_checksum() {
        let entries = [file(0o100644, None), file(0o100644, text("abc"))];
        assert_eq!(
            check_checksums("/f", &members(&entries, &["A", "B"]), XATTR),
            vec![Divergence::MissingChecksum {
                uri: "A".into(),
                path: "/f".into()
            }]
        );
    }

    #[test]
    fn test_equal_string_checksums() {
        let entries = [file(0o100644, text("abc")), file(0o100644, text("abc"))];
        assert!(check_checksums("/f", &members(&entries, &["A", "B"]), XATTR).is_empty());
    }

    #[test]
    fn test_invalid_checksum_type() {
        let entries = [
            file(0o100644, Some(XattrValue::UInt64(42))),
            file(0o100644, Some(XattrValue::Boolean(true))),
        ];
        assert_eq!(
            check_checksums("/f", &members(&entries, &["A", "B"]), XATTR),
            vec![
                Divergence::InvalidChecksum {
                    uri: "A".into(),
                    path: "/f".into()
                },
                Divergence::InvalidChecksum {
                    uri: "B".into(),
                    path: "/f".into()
                },
            ]
        );
    }

    #[test]
    fn test_single_mismatch_for_many_disagreements() {
        let entries = [
            file(0o100644, text("a")),
            file(0o100644, text("b")),
            file(0o100644, text("c")),
        ];
        assert_eq!(
            check_checksums("/f", &members(&entries, &["A", "B", "C"]), XATTR),
            vec![Divergence::ChecksumMismatch { path: "/f".into() }]
        );
    }

    #[test]
    fn test_mismatch_after_per_backend_reports() {
        let entries = [
            file(0o100644, None),
            file(0o100644, Some(XattrValue::Binary(vec![1, 2]))),
            file(0o100644, Some(XattrValue::Binary(vec![1, 2, 3]))),
        ];
        let found = check_checksums("/f", &members(&entries, &["A", "B", "C"]), XATTR);
        assert_eq!(found.len(), 2);
        assert!(matches!(found[0], Divergence::MissingChecksum { .. }));
        assert!(matches!(found[1], Divergence::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_non_regular_files_skipped() {
        let entries = [
            FsEntry::new("/d", 0o040755),
            FsEntry::new("/d", 0o040755).with_xattr(XATTR, XattrValue::Int32(1)),
        ];
        assert!(check_checksums("/d", &members(&entries, &["A", "B"]), XATTR).is_empty());
    }

    #[test]
    fn test_checksum_equality_rules() {
        let s = XattrValue::String("ab".into());
        let b = XattrValue::Binary(b"ab".to_vec());
        assert!(checksums_equal(&s, &s.clone()));
        assert!(checksums_equal(&b, &b.clone()));
        assert!(!checksums_equal(&s, &b));
        assert!(!checksums_equal(&b, &s));
        // Full content compared, not a prefix
        assert!(!checksums_equal(
            &XattrValue::Binary(vec![1, 2, 0]),
            &XattrValue::Binary(vec![1, 2, 1])
        ));
        assert!(is_checksum_type(&s));
        assert!(!is_checksum_type(&XattrValue::Sequence(vec![s])));
    }

    #[test]
    fn test_custom_attribute_name() {
        let entries = [
            FsEntry::new("/f", 0o100644).with_xattr("user.sha256", XattrValue::String("x".into())),
            FsEntry::new("/f", 0o100644).with_xattr("user.sha256", XattrValue::String("x".into())),
        ];
        let uris = ["A", "B"];
        assert!(check_checksums("/f", &members(&entries, &uris), "user.sha256").is_empty());
        assert_eq!(
            check_checksums("/f", &members(&entries, &uris), XATTR).len(),
            2
        );
    }
}
