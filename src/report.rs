//! Diff reporting
//!
//! The engine describes every divergence it finds as a [`Divergence`] value
//! and hands it to a [`DiffReporter`]. [`LineReporter`] renders one line per
//! divergence to any writer; [`CollectingReporter`] keeps them in memory.
//!
//! Legacy lines keep the historical wording byte-for-byte, including the
//! misspelt checksum line, so existing consumers of the output keep working:
//!
//! ```text
//! <uri>: missing '<path>'
//! '<path>' mode mismatch
//! <uri>: '<path>' invalid checksum xattr
//! <uri>: '<path>' missing checksum xattr
//! '<path>' checksum missmatch
//! ```

use crate::config::ReportFormat;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// One difference found between the compared snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Divergence {
    /// `path` exists in some backends but not in `uri`
    Missing { uri: String, path: String },

    /// Backends holding `path` disagree on its mode
    ModeMismatch { path: String },

    /// The checksum attribute of `path` in `uri` is neither string nor binary
    InvalidChecksum { uri: String, path: String },

    /// `path` in `uri` is a regular file without a checksum attribute
    MissingChecksum { uri: String, path: String },

    /// Backends holding `path` carry different checksums
    ChecksumMismatch { path: String },
}

impl Divergence {
    /// Path the divergence is about
    pub fn path(&self) -> &str {
        match self {
            Divergence::Missing { path, .. }
            | Divergence::ModeMismatch { path }
            | Divergence::InvalidChecksum { path, .. }
            | Divergence::MissingChecksum { path, .. }
            | Divergence::ChecksumMismatch { path } => path,
        }
    }

    /// Backend the divergence is attributed to, if any
    pub fn uri(&self) -> Option<&str> {
        match self {
            Divergence::Missing { uri, .. }
            | Divergence::InvalidChecksum { uri, .. }
            | Divergence::MissingChecksum { uri, .. } => Some(uri),
            Divergence::ModeMismatch { .. } | Divergence::ChecksumMismatch { .. } => None,
        }
    }

    /// Render as a single line (without the trailing newline)
    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Legacy => TextLine {
                divergence: self,
                mismatch_word: "missmatch",
            }
            .to_string(),
            ReportFormat::Revised => TextLine {
                divergence: self,
                mismatch_word: "mismatch",
            }
            .to_string(),
            // A derived Serialize over plain strings cannot fail
            ReportFormat::Json => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

struct TextLine<'a> {
    divergence: &'a Divergence,
    mismatch_word: &'static str,
}

impl fmt::Display for TextLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.divergence {
            Divergence::Missing { uri, path } => write!(f, "{}: missing '{}'", uri, path),
            Divergence::ModeMismatch { path } => write!(f, "'{}' mode mismatch", path),
            Divergence::InvalidChecksum { uri, path } => {
                write!(f, "{}: '{}' invalid checksum xattr", uri, path)
            }
            Divergence::MissingChecksum { uri, path } => {
                write!(f, "{}: '{}' missing checksum xattr", uri, path)
            }
            Divergence::ChecksumMismatch { path } => {
                write!(f, "'{}' checksum {}", path, self.mismatch_word)
            }
        }
    }
}

/// Receiver of divergences, in discovery order
pub trait DiffReporter {
    fn report(&mut self, divergence: &Divergence) -> io::Result<()>;

    /// Called once after the last divergence
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R: DiffReporter + ?Sized> DiffReporter for &mut R {
    fn report(&mut self, divergence: &Divergence) -> io::Result<()> {
        (**self).report(divergence)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Writes one line per divergence
pub struct LineReporter<W: Write> {
    writer: W,
    format: ReportFormat,
}

impl<W: Write> LineReporter<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self { writer, format }
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiffReporter for LineReporter<W> {
    fn report(&mut self, divergence: &Divergence) -> io::Result<()> {
        writeln!(self.writer, "{}", divergence.render(self.format))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps every divergence in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    divergences: Vec<Divergence>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn divergences(&self) -> &[Divergence] {
        &self.divergences
    }

    pub fn into_divergences(self) -> Vec<Divergence> {
        self.divergences
    }

    /// Render everything collected so far
    pub fn lines(&self, format: ReportFormat) -> Vec<String> {
        self.divergences.iter().map(|d| d.render(format)).collect()
    }
}

impl DiffReporter for CollectingReporter {
    fn report(&mut self, divergence: &Divergence) -> io::Result<()> {
        self.divergences.push(divergence.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_kinds() -> Vec<Divergence> {
        vec![
            Divergence::Missing {
                uri: "B".into(),
                path: "/b".into(),
            },
            Divergence::ModeMismatch { path: "/x".into() },
            Divergence::InvalidChecksum {
                uri: "A".into(),
                path: "/f".into(),
            },
            Divergence::MissingChecksum {
                uri: "A".into(),
                path: "/f".into(),
            },
            Divergence::ChecksumMismatch { path: "/f".into() },
        ]
    }

    #[test]
    fn test_legacy_lines() {
        let lines: Vec<String> = all_kinds()
            .iter()
            .map(|d| d.render(ReportFormat::Legacy))
            .collect();
        assert_eq!(
            lines,
            vec![
                "B: missing '/b'",
                "'/x' mode mismatch",
                "A: '/f' invalid checksum xattr",
                "A: '/f' missing checksum xattr",
                "'/f' checksum missmatch",
            ]
        );
    }

    #[test]
    fn test_revised_wording() {
        let d = Divergence::ChecksumMismatch { path: "/f".into() };
        assert_eq!(d.render(ReportFormat::Revised), "'/f' checksum mismatch");

        let d = Divergence::Missing {
            uri: "B".into(),
            path: "/b".into(),
        };
        assert_eq!(d.render(ReportFormat::Revised), "B: missing '/b'");
    }

    #[test]
    fn test_json_lines() {
        let d = Divergence::Missing {
            uri: "sqlite:b.db".into(),
            path: "/a \"quoted\"".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&d.render(ReportFormat::Json)).unwrap();
        assert_eq!(value["kind"], "missing");
        assert_eq!(value["uri"], "sqlite:b.db");
        assert_eq!(value["path"], "/a \"quoted\"");

        let d = Divergence::ChecksumMismatch { path: "/f".into() };
        assert_eq!(
            d.render(ReportFormat::Json),
            r#"{"kind":"checksum_mismatch","path":"/f"}"#
        );
    }

    #[test]
    fn test_line_reporter_writes_lines() {
        let mut reporter = LineReporter::new(Vec::new(), ReportFormat::Legacy);
        for d in all_kinds().iter().take(2) {
            reporter.report(d).unwrap();
        }
        reporter.finish().unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "B: missing '/b'\n'/x' mode mismatch\n");
    }

    #[test]
    fn test_accessors() {
        let kinds = all_kinds();
        assert_eq!(kinds[0].uri(), Some("B"));
        assert_eq!(kinds[1].uri(), None);
        assert_eq!(kinds[4].path(), "/f");
    }
}
