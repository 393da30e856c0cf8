//! Line-terminator and quoting detection from the leading lines of a file.
//!
//! Both settings toggle options in the generated `BULK INSERT` statement.

use std::fmt;

use serde::Serialize;

/// Number of leading physical lines inspected.
pub const DIALECT_SAMPLE_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineTerminator {
    Lf,
    Crlf,
}

impl fmt::Display for LineTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineTerminator::Lf => f.write_str("LF"),
            LineTerminator::Crlf => f.write_str("CRLF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dialect {
    pub line_terminator: LineTerminator,
    /// Whether any field in the sampled lines is wrapped in double quotes.
    pub quoted: bool,
}

/// Inspects the first [`DIALECT_SAMPLE_LINES`] lines of `text`, splitting
/// fields on the delimiter exactly as given (before any normalization).
///
/// A single CRLF-terminated line is enough to select CRLF.
pub fn detect_dialect(text: &str, delimiter: &str) -> Dialect {
    let mut crlf = false;
    let mut quoted = false;

    for line in text.split_inclusive('\n').take(DIALECT_SAMPLE_LINES) {
        if line.ends_with("\r\n") {
            crlf = true;
        }
        let content = line.trim_end_matches(['\r', '\n']);
        quoted |= content
            .split(delimiter)
            .any(|field| field.len() >= 2 && field.starts_with('"') && field.ends_with('"'));
    }

    Dialect {
        line_terminator: if crlf {
            LineTerminator::Crlf
        } else {
            LineTerminator::Lf
        },
        quoted,
    }
}
