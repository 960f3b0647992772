//! Source locations shared by tokens, errors and diagnostics.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// A point in a source file.
///
/// `line` and `column` are 1-based; `offset` is the 0-based byte offset
/// into the buffer the lexer was given. The file name is reference
/// counted so every token of a file can carry it cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Location {
    pub fn new(file: Arc<str>, line: u32, column: u32, offset: usize) -> Self {
        Location {
            file,
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
