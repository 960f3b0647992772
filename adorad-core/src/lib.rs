//! Front end of the Adorad language toolchain.
//!
//! The pipeline is:
//!
//!   source .ad
//!     -> lexer   (tokens)
//!     -> parser  (AST)
//!
//! Tools such as the CLI should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

// ---------------------------------------------------------------------
// Source loading and orchestration
// ---------------------------------------------------------------------

pub mod source;
pub mod frontend;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use ast::{AstNode, SourceUnit};
pub use diagnostic::Diagnostic;
pub use error::{CoreError, LexError, LexErrorKind, ParseError};
pub use frontend::{parse_file, parse_source};
pub use lexer::{Lexer, tokenize};
pub use parser::{Parser, parse};
pub use span::Location;
pub use token::{Token, TokenKind};
