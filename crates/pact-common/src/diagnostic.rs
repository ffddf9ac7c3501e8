//! Diagnostics shared by the lexer, parser, and executor.
//!
//! All three stages render through the same `Error|Warning: on Line N`
//! format (see the external interfaces section of the spec), so a single
//! `Diagnostic` type is used everywhere rather than three incompatible
//! per-crate error enums.

use std::fmt;

/// A diagnostic with line context, rendered in the fixed house format:
///
/// ```text
/// Error: on Line 3
/// >>> !: zzz
/// Undefined global name zzz
///
/// ```
///
/// `severity` selects the `Error`/`Warning` tag. `severity` is `Error` for
/// every diagnostic that should also stop the program (see
/// [`Diagnostic::is_fatal`]); non-fatal issues always render as `Warning`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Zero-based source line index.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            message: message.into(),
        }
    }

    /// Whether this diagnostic should terminate the program after being
    /// printed. Errors are fatal, warnings are not.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the diagnostic's fixed-format text, given the offending
    /// source line for the `>>>` context line. Includes the trailing blank
    /// line that terminates each diagnostic.
    pub fn render(&self, source_line: &str) -> String {
        let tag = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        format!(
            "{tag}: on Line {}\n>>> {source_line}\n{}\n\n",
            self.line + 1,
            self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_fatal_warning_is_not() {
        assert!(Diagnostic::error(0, "x").is_fatal());
        assert!(!Diagnostic::warning(0, "x").is_fatal());
    }

    #[test]
    fn render_matches_fixed_format() {
        let d = Diagnostic::error(2, "Undefined global name zzz");
        assert_eq!(
            d.render("!: zzz"),
            "Error: on Line 3\n>>> !: zzz\nUndefined global name zzz\n\n"
        );
    }

    #[test]
    fn render_warning_tag() {
        let d = Diagnostic::warning(0, "missing colon");
        assert_eq!(
            d.render("n [n - 1]"),
            "Warning: on Line 1\n>>> n [n - 1]\nmissing colon\n\n"
        );
    }
}
