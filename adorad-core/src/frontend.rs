use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::ast::SourceUnit;
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::source::SourceFile;

/// Lex and parse one buffer. `file` only names the source in locations.
pub fn parse_source<S>(file: impl Into<Arc<str>>, source: &S) -> Result<SourceUnit, CoreError>
where
    S: AsRef<[u8]> + ?Sized,
{
    let file = file.into();
    let tokens = tokenize(file.clone(), source)?;
    let unit = parse(tokens)?;
    debug!(file = %file, items = unit.items.len(), "front end finished");
    Ok(unit)
}

/// Read and parse a file from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<SourceUnit, CoreError> {
    let file = SourceFile::read(path)?;
    parse_source(file.display_name(), &file.contents)
}

/// Diagnostic for errors that point into source text. I/O failures have
/// no location and return `None`.
pub fn diagnostic(err: &CoreError) -> Option<Diagnostic> {
    match err {
        CoreError::Lex(err) => Some(Diagnostic::from(err)),
        CoreError::Parse(err) => Some(Diagnostic::from(err)),
        CoreError::SourceIo { .. } | CoreError::MissingSource(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::codes;
    use std::fs;
    use tempfile::tempdir;

    #[test_log::test]
    fn parses_a_small_program() {
        let unit = parse_source(
            "hello.ad",
            "module hello\n\
             import io\n\
             \n\
             export func main() -> int {\n\
             \x20   any greeting = \"hi\\n\";\n\
             \x20   io.print(greeting);\n\
             \x20   return 0;\n\
             }\n",
        )
        .expect("parse");
        assert_eq!(unit.module_name.as_deref(), Some("hello"));
        assert_eq!(unit.num_lines, 8);
        assert_eq!(unit.items.len(), 3);
        assert_eq!(
            unit.items[2].to_string(),
            "(func export main () int (block (var any greeting \"hi\\n\") \
             (call (. io print) greeting) (return 0)))"
        );
    }

    #[test]
    fn lex_errors_surface_as_core_errors() {
        let err = parse_source("bad.ad", "module $").unwrap_err();
        assert!(matches!(err, CoreError::Lex(_)));
        assert_eq!(err.to_string(), "lex error at bad.ad:1:8: unrecognized character");
        assert_eq!(diagnostic(&err).map(|d| d.code), Some(codes::UNEXPECTED_CHARACTER));
    }

    #[test]
    fn parse_errors_surface_as_core_errors() {
        let err = parse_source("bad.ad", "func f() -> void {").unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
        assert_eq!(diagnostic(&err).map(|d| d.code), Some(codes::EXPECTED_TOKEN));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("lib.ad");
        fs::write(&path, "module lib;\nstruct Pair { int a, int b }\n").expect("write");

        let unit = parse_file(&path).expect("parse");
        assert_eq!(unit.module_name.as_deref(), Some("lib"));
        assert_eq!(unit.num_lines, 2);
    }

    #[test]
    fn parse_file_accepts_latin1_bytes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("latin1.ad");
        fs::write(&path, b"module m # r\xe9sum\xe9\nstring s = \"\xa9 2024\"\n").expect("write");

        let unit = parse_file(&path).expect("parse");
        assert_eq!(unit.num_lines, 2);
        assert_eq!(unit.items[1].to_string(), "(var string s \"\u{a9} 2024\")");
    }

    #[test]
    fn units_serialize_to_json() {
        let unit = parse_source("j.ad", "module j\nint x = 1").expect("parse");
        let json = serde_json::to_value(&unit).expect("json");
        assert_eq!(json["module_name"], "j");
        assert_eq!(json["items"][0]["ModuleStatement"]["name"], "j");
        assert_eq!(json["items"][1]["VariableDecl"]["init"]["IntegerLiteral"], 1);
    }

    #[test]
    fn missing_file_has_no_diagnostic() {
        let dir = tempdir().expect("tempdir");
        let err = parse_file(dir.path().join("nope.ad")).unwrap_err();
        assert!(matches!(err, CoreError::SourceIo { .. }));
        assert!(diagnostic(&err).is_none());
    }
}
