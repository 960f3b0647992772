//! User-facing diagnostics built from lex and parse errors.

use std::fmt;

use serde::Serialize;

use crate::error::{LexError, LexErrorKind, ParseError};
use crate::lexer::latin1;
use crate::span::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Stable diagnostic codes.
pub mod codes {
    pub const UNEXPECTED_CHARACTER: &str = "E0001";
    pub const UNTERMINATED_STRING: &str = "E0002";
    pub const UNTERMINATED_COMMENT: &str = "E0003";
    pub const UNKNOWN_ESCAPE: &str = "E0004";
    pub const MALFORMED_NUMBER: &str = "E0005";
    pub const EXPECTED_TOKEN: &str = "E0100";
    pub const INVALID_SYNTAX: &str = "E0101";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub location: Location,
    /// Short note printed under the caret.
    pub label: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, location: Location) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            location,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Render the diagnostic with the offending line of `source` and a
    /// caret under the reported column.
    pub fn render<S: AsRef<[u8]> + ?Sized>(&self, source: &S) -> String {
        let mut out = format!("{self}\n");
        let Some(text) = source_line(source.as_ref(), self.location.line).map(latin1) else {
            return out;
        };

        let number = self.location.line.to_string();
        let gutter = " ".repeat(number.len());
        let column = self.location.column.saturating_sub(1) as usize;
        out.push_str(&format!("{gutter} |\n{number} | {text}\n{gutter} | "));
        out.push_str(&" ".repeat(column));
        out.push('^');
        if let Some(label) = &self.label {
            out.push(' ');
            out.push_str(label);
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location, self.severity, self.code, self.message
        )
    }
}

impl From<&LexError> for Diagnostic {
    fn from(err: &LexError) -> Self {
        let code = match err.kind {
            LexErrorKind::UnexpectedCharacter => codes::UNEXPECTED_CHARACTER,
            LexErrorKind::UnterminatedString => codes::UNTERMINATED_STRING,
            LexErrorKind::UnterminatedComment => codes::UNTERMINATED_COMMENT,
            LexErrorKind::UnknownEscape => codes::UNKNOWN_ESCAPE,
            LexErrorKind::MissingRadixDigits => codes::MALFORMED_NUMBER,
        };
        Diagnostic::error(code, err.message.clone(), err.location.clone())
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        match &err.expected {
            Some(expected) => {
                Diagnostic::error(codes::EXPECTED_TOKEN, err.message.clone(), err.location.clone())
                    .with_label(format!("expected {expected} here"))
            }
            None => Diagnostic::error(codes::INVALID_SYNTAX, err.message.clone(), err.location.clone()),
        }
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        Diagnostic::from(&err)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::from(&err)
    }
}

/// The 1-based `line` of `source`. `\r\n` and a lone `\r` both end a
/// line, matching the lexer's line counting.
fn source_line(source: &[u8], line: u32) -> Option<&[u8]> {
    let mut rest = source;
    let mut current = 1;
    loop {
        let end = rest
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .unwrap_or(rest.len());
        if current == line {
            return Some(&rest[..end]);
        }
        if end == rest.len() {
            return None;
        }
        let skip = if rest[end..].starts_with(b"\r\n") { 2 } else { 1 };
        rest = &rest[end + skip..];
        current += 1;
    }
}
