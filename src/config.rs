//! Configuration types for snapdiff
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Backend URI parsing

use crate::error::{BackendError, ConfigError};
use clap::Parser;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Default extended attribute carrying a content checksum
pub const DEFAULT_CHECKSUM_XATTR: &str = "user.hash";

/// Page size limits
const MIN_PAGE_SIZE: usize = 1;
const MAX_PAGE_SIZE: usize = 100_000;

/// Regex for parsing backend URIs
static BACKEND_URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: scheme:path or scheme:///absolute/path
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*):(?://)?(.+)$").expect("Invalid backend URI regex")
});

/// Compare filesystem metadata snapshots held by several backends
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snapdiff",
    version,
    about = "Compare filesystem metadata snapshots across backends",
    long_about = "Streams every snapshot in path order and merges them in lockstep, reporting \
                  entries missing from some backends, mode mismatches and, optionally, \
                  checksum extended attributes that disagree.\n\n\
                  Diff lines go to stdout; logs, progress and the summary go to stderr.",
    after_help = "EXAMPLES:\n    \
        snapdiff sqlite:before.db sqlite:after.db\n    \
        snapdiff --checksum sqlite:///mnt/a.db sqlite:///mnt/b.db sqlite:///mnt/c.db\n    \
        snapdiff --format json -s sqlite:a.db rocksdb:b.rocks"
)]
pub struct CliArgs {
    /// Backends to compare (scheme:path, at least two)
    #[arg(value_name = "URI", required = true)]
    pub uris: Vec<String>,

    /// Compare checksum extended attributes of regular files
    #[arg(long)]
    pub checksum: bool,

    /// Name of the extended attribute holding the checksum
    #[arg(
        long,
        env = "SNAPDIFF_CHECKSUM_XATTR",
        default_value = DEFAULT_CHECKSUM_XATTR,
        value_name = "NAME"
    )]
    pub checksum_xattr: String,

    /// Output format for diff lines
    #[arg(long, value_enum, default_value_t = ReportFormat::Legacy)]
    pub format: ReportFormat,

    /// Entries fetched per backend query
    #[arg(long, default_value = "1000", value_name = "NUM")]
    pub page_size: usize,

    /// Show a progress spinner on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Print a summary on stderr when done
    #[arg(short = 's', long)]
    pub summary: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Shape of the emitted diff lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Historical wording, kept byte-for-byte
    #[default]
    Legacy,
    /// Same lines with the checksum wording corrected
    Revised,
    /// One JSON object per line
    Json,
}

/// Parsed backend URI components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUri {
    /// The URI as given; used verbatim in reports
    pub raw: String,

    /// Backend kind, lowercased (e.g. `sqlite`)
    pub scheme: String,

    /// Backend-specific location, usually a filesystem path
    pub location: String,
}

impl BackendUri {
    /// Parse a backend URI
    ///
    /// Accepts formats:
    /// - sqlite:snapshot.db
    /// - sqlite:/abs/snapshot.db
    /// - sqlite:///abs/snapshot.db
    pub fn parse(uri: &str) -> Result<Self, BackendError> {
        let trimmed = uri.trim();

        let caps = BACKEND_URI_REGEX
            .captures(trimmed)
            .ok_or_else(|| BackendError::InvalidUri {
                uri: uri.to_string(),
                reason: "Expected format: scheme:path".into(),
            })?;

        let scheme = caps
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .ok_or_else(|| BackendError::InvalidUri {
                uri: uri.to_string(),
                reason: "Missing scheme".into(),
            })?;

        let location = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| BackendError::InvalidUri {
                uri: uri.to_string(),
                reason: "Missing location".into(),
            })?;

        Ok(Self {
            raw: uri.to_string(),
            scheme,
            location,
        })
    }
}

impl fmt::Display for BackendUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Backends to compare, in command-line order
    pub uris: Vec<BackendUri>,

    /// Compare checksum attributes
    pub checksum: bool,

    /// Checksum attribute name
    pub checksum_xattr: String,

    /// Diff line format
    pub format: ReportFormat,

    /// Backend page size
    pub page_size: usize,

    /// Show progress indicator
    pub show_progress: bool,

    /// Print summary when done
    pub show_summary: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl DiffConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.uris.len() < 2 {
            return Err(ConfigError::NotEnoughUris {
                count: args.uris.len(),
            });
        }

        let uris = args
            .uris
            .iter()
            .map(|u| {
                BackendUri::parse(u).map_err(|e| ConfigError::InvalidUri {
                    uri: u.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Validate page size
        if args.page_size < MIN_PAGE_SIZE || args.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize {
                size: args.page_size,
                min: MIN_PAGE_SIZE,
                max: MAX_PAGE_SIZE,
            });
        }

        validate_xattr_name(&args.checksum_xattr)?;

        Ok(Self {
            uris,
            checksum: args.checksum,
            checksum_xattr: args.checksum_xattr,
            format: args.format,
            page_size: args.page_size,
            show_progress: args.progress,
            show_summary: args.summary,
            verbose: args.verbose,
        })
    }
}

fn validate_xattr_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidXattrName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('\0') {
        return Err(invalid("name contains a NUL byte"));
    }
    Ok(())
}
