//! # P7Pack Terminal Output (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//!
//! ## Overview
//!
//! Helpers for the human-readable side of a job: byte counts rendered with
//! 1024-based units, and a `Console` that routes report lines either to stdout
//! or, when stdout is reserved for machine-readable output (`--json`), to stderr.
//!
//! ```rust
//! assert_eq!(ui::format_size(1536), "1.50 KB");
//! let console = ui::Console::new(false);
//! console.line("Total input size: 1.50 KB");
//! ```
//!
use std::io::Write;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with two decimals in the largest unit below 1024,
/// from `B` up to `PB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

/// Like `format_size`, with a leading `-` for negative values.
pub fn format_signed_size(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_size(bytes.unsigned_abs()))
    } else {
        format_size(bytes.unsigned_abs())
    }
}

/// Destination for human-readable job output.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    to_stderr: bool,
}

impl Console {
    /// `to_stderr` keeps stdout free for structured output.
    pub fn new(to_stderr: bool) -> Self {
        Console { to_stderr }
    }

    /// Writes one line of the human-readable report.
    ///
    /// # Arguments
    ///
    /// * `text` - The line to print; embedded newlines are written as-is.
    ///
    /// Write failures are ignored: a closed pipe on the report stream must not
    /// fail the job that is being reported on.
    pub fn line(&self, text: &str) {
        if self.to_stderr {
            let _ = writeln!(std::io::stderr(), "{}", text);
        } else {
            let mut stdout = std::io::stdout();
            let _ = writeln!(stdout, "{}", text);
            let _ = stdout.flush();
        }
    }

    /// Prints a `=` rule framing a title, as used for the job banners.
    pub fn banner(&self, title: &str) {
        let rule = "=".repeat(60);
        self.line(&format!("\n{}\n{}\n{}", rule, title, rule));
    }

    /// Prints a `-` separator line.
    pub fn rule(&self) {
        self.line(&"-".repeat(60));
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_boundaries() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
        assert_eq!(format_size(1024u64.pow(4)), "1.00 TB");
        assert_eq!(format_size(3 * 1024u64.pow(5)), "3.00 PB");
    }

    #[test]
    fn test_format_size_unit_is_monotonic() {
        let unit_rank = |s: &str| {
            let unit = s.rsplit(' ').next().unwrap();
            ["B", "KB", "MB", "GB", "TB", "PB"]
                .iter()
                .position(|u| *u == unit)
                .unwrap()
        };
        let mut last = 0;
        for exp in 0..6u32 {
            for n in [1024u64.pow(exp).saturating_sub(1), 1024u64.pow(exp)] {
                let rank = unit_rank(&format_size(n));
                assert!(rank >= last, "unit went backwards at {}", n);
                last = rank;
            }
        }
    }

    #[test]
    fn test_format_signed_size() {
        assert_eq!(format_signed_size(-2048), "-2.00 KB");
        assert_eq!(format_signed_size(512), "512.00 B");
    }
}
