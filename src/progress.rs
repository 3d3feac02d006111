//! Progress reporting for diff runs
//!
//! Everything here draws on stderr; stdout carries only diff lines.

use crate::engine::DiffStats;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner showing how far the merge has got
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(spinner);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, stats: &DiffStats) {
        let msg = format!(
            "Paths: {} | Entries: {} | Divergences: {}",
            format_number(stats.rounds),
            format_number(stats.entries_read),
            format_number(stats.divergences()),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the diff to stderr
pub fn print_summary(stats: &DiffStats, uris: &[&str]) {
    let title = if stats.is_clean() {
        style("Snapshots Match").green().bold()
    } else {
        style("Snapshots Differ").yellow().bold()
    };

    eprintln!();
    eprintln!("{}", title);
    eprintln!("{}", style("─".repeat(50)).dim());
    for (i, uri) in uris.iter().enumerate() {
        eprintln!("  {} {}", style(format!("Source {}:", i + 1)).bold(), uri);
    }
    eprintln!("  {} {}", style("Paths:").bold(), format_number(stats.rounds));
    eprintln!(
        "  {} {}",
        style("Entries read:").bold(),
        format_number(stats.entries_read)
    );
    eprintln!(
        "  {} {:.1}s ({:.0} paths/sec)",
        style("Duration:").bold(),
        stats.duration.as_secs_f64(),
        stats.rounds_per_second()
    );

    let counts = [
        ("Missing:", stats.missing),
        ("Mode mismatches:", stats.mode_mismatches),
        ("Missing checksums:", stats.missing_checksums),
        ("Invalid checksums:", stats.invalid_checksums),
        ("Checksum mismatches:", stats.checksum_mismatches),
    ];
    for (label, count) in counts.iter().filter(|(_, count)| *count > 0) {
        eprintln!("  {} {}", style(label).yellow().bold(), format_number(*count));
    }
    eprintln!();
}
