//! ANSI coloring for operator output

use crate::telemetry::Severity;

pub const COLOR_RED: &str = "\x1b[0;31m";
pub const COLOR_GREEN: &str = "\x1b[0;32m";
pub const COLOR_YELLOW: &str = "\x1b[0;33m";
pub const COLOR_RESET: &str = "\x1b[0m";

/// Color for a severity's status lines.
pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Normal => COLOR_GREEN,
        Severity::Warning => COLOR_YELLOW,
        Severity::Critical => COLOR_RED,
    }
}

/// Fixed-width status label, as shown next to each sent record.
pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Normal => "[NORMAL]  ",
        Severity::Warning => "[WARNING] ",
        Severity::Critical => "[CRITICAL]",
    }
}
