use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::span::Location;

/// What went wrong while lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LexErrorKind {
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedComment,
    UnknownEscape,
    MissingRadixDigits,
}

impl LexErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            LexErrorKind::UnexpectedCharacter => "unrecognized character",
            LexErrorKind::UnterminatedString => "unterminated string literal",
            LexErrorKind::UnterminatedComment => "unterminated block comment",
            LexErrorKind::UnknownEscape => "unknown escape sequence",
            LexErrorKind::MissingRadixDigits => "expected digits after radix prefix",
        }
    }
}

/// A malformed character sequence found while lexing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error at {location}: {message}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub message: String,
    pub location: Location,
}

impl LexError {
    pub fn new(kind: LexErrorKind, location: Location) -> Self {
        LexError {
            kind,
            message: kind.message().to_string(),
            location,
        }
    }
}

/// A fatal grammar violation found while parsing.
///
/// `expected`/`found` are filled in when the failure came from a token
/// mismatch, so drivers can render them separately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub expected: Option<String>,
    pub found: Option<String>,
    pub location: Location,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        ParseError {
            message: message.into(),
            expected: None,
            found: None,
            location,
        }
    }

    pub fn expected(expected: impl Into<String>, found: impl Into<String>, location: Location) -> Self {
        let expected = expected.into();
        let found = found.into();
        ParseError {
            message: format!("expected {expected}; found {found}"),
            expected: Some(expected),
            found: Some(found),
            location,
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source {path}: {source}")]
    SourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("source path was not found at {0}")]
    MissingSource(PathBuf),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
