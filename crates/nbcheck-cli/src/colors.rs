//! ANSI styling for terminal report lines.

use std::fmt::Display;
use std::io::{self, Write};

const RESET: &str = "\x1b[0m";

/// Text styles used by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Pass,
    Fail,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "\x1b[1m",
            Style::Dim => "\x1b[2m",
            Style::Pass => "\x1b[32m",
            Style::Fail => "\x1b[31m",
        }
    }
}

/// Wrap `text` in `style`, resetting afterwards.
pub fn paint(style: Style, text: impl Display) -> String {
    format!("{}{}{}", style.code(), text, RESET)
}

/// Colored ✓ or ❌ for a document outcome.
pub fn mark(passed: bool) -> String {
    if passed {
        paint(Style::Pass, "✓")
    } else {
        paint(Style::Fail, "❌")
    }
}

/// Flush stdout so a progress line without a newline shows up before the
/// document runs.
#[inline]
pub fn flush_stdout() {
    io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_wraps_and_resets() {
        assert_eq!(paint(Style::Bold, "x"), "\x1b[1mx\x1b[0m");
        assert!(mark(true).contains('✓'));
        assert!(mark(false).contains('❌'));
    }
}
