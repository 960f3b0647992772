use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use adorad_core::error::CoreError;
use adorad_core::frontend::{diagnostic, parse_source};
use adorad_core::lexer::tokenize;
use adorad_core::source::{SourceFile, load_source_files};
use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Lex and parse Adorad sources.
#[derive(Parser, Debug)]
#[command(name = "adorad", version, about, long_about = None)]
struct Cli {
    /// Source files or directories to process. `-` or no path reads stdin.
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = Emit::Ast)]
    emit: Emit,

    #[arg(short, long, value_name = "PATH", help = "Write output to PATH instead of stdout")]
    output: Option<PathBuf>,

    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides"
    )]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// One line per token
    Tokens,
    /// S-expression rendering of the syntax tree
    Ast,
    /// The syntax tree as JSON
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let mut output = String::new();
    let mut processed = 0usize;
    let mut failed = 0usize;

    let read_stdin = cli.paths.is_empty() || cli.paths.iter().any(|path| path == Path::new("-"));
    if read_stdin {
        let mut contents = Vec::new();
        io::stdin()
            .read_to_end(&mut contents)
            .context("failed to read source from stdin")?;
        let file = SourceFile {
            path: PathBuf::from("<stdin>"),
            contents,
        };
        processed += 1;
        if !process(&file, cli.emit, &mut output) {
            failed += 1;
        }
    }

    for path in cli.paths.iter().filter(|path| *path != Path::new("-")) {
        let files = match load_source_files(path) {
            Ok(files) => files,
            Err(err) => {
                eprintln!("error: {err}");
                processed += 1;
                failed += 1;
                continue;
            }
        };
        for file in &files {
            processed += 1;
            if !process(file, cli.emit, &mut output) {
                failed += 1;
            }
        }
    }

    match &cli.output {
        Some(path) => write_output(path, output.as_bytes())?,
        None => print!("{output}"),
    }

    info!(processed, failed, "done");
    if failed > 0 {
        bail!("{failed} of {processed} source file(s) failed");
    }
    Ok(())
}

/// Emit one file into `output`, reporting any error on stderr. Returns
/// whether the file succeeded.
fn process(file: &SourceFile, emit: Emit, output: &mut String) -> bool {
    debug!(path = %file.path.display(), ?emit, "processing source");
    match render(file, emit) {
        Ok(text) => {
            output.push_str(&text);
            true
        }
        Err(err) => {
            match err.downcast_ref::<CoreError>().and_then(diagnostic) {
                Some(diag) => eprint!("{}", diag.render(&file.contents)),
                None => eprintln!("error: {err:#}"),
            }
            false
        }
    }
}

fn render(file: &SourceFile, emit: Emit) -> Result<String> {
    let name = file.display_name();
    let text = match emit {
        Emit::Tokens => {
            let tokens = tokenize(name, &file.contents).map_err(CoreError::from)?;
            tokens
                .iter()
                .map(|token| format!("{} {:?} {:?}\n", token.location, token.kind, token.value))
                .collect()
        }
        Emit::Ast => parse_source(name, &file.contents)?.to_string(),
        Emit::Json => {
            let unit = parse_source(name, &file.contents)?;
            let mut json = serde_json::to_string_pretty(&unit)
                .with_context(|| format!("failed to serialize {}", file.path.display()))?;
            json.push('\n');
            json
        }
    };
    Ok(text)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn prints_ast_for_a_file() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("main.ad");
        fs::write(&input_path, "module main\nfunc f() -> int { return 1 + 2 * 3; }\n")
            .expect("write input");

        Command::cargo_bin("adorad")
            .expect("binary exists")
            .arg(&input_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("(module main)"))
            .stdout(predicate::str::contains(
                "(func f () int (block (return (+ 1 (* 2 3)))))",
            ));
    }

    #[test]
    fn reads_stdin_when_no_path_is_given() {
        Command::cargo_bin("adorad")
            .expect("binary exists")
            .write_stdin("import io;")
            .assert()
            .success()
            .stdout("(import io)\n");
    }

    #[test]
    fn accepts_latin1_input() {
        Command::cargo_bin("adorad")
            .expect("binary exists")
            .args(["--emit", "tokens", "-"])
            .write_stdin(b"# \xe9t\xe9\nstring s = \"gr\xfc\xdf\"".to_vec())
            .assert()
            .success()
            .stdout(predicate::str::contains("<stdin>:2:12 String \"grüß\""));
    }

    #[test]
    fn emits_tokens() {
        Command::cargo_bin("adorad")
            .expect("binary exists")
            .args(["--emit", "tokens", "-"])
            .write_stdin("x += 1")
            .assert()
            .success()
            .stdout(predicate::str::contains("<stdin>:1:1 Identifier \"x\""))
            .stdout(predicate::str::contains("<stdin>:1:3 PlusEq \"+=\""))
            .stdout(predicate::str::contains("<stdin>:1:7 Eof \"\""));
    }

    #[test]
    fn emits_json_to_output_file() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("lib.ad");
        fs::write(&input_path, "module lib").expect("write input");
        let output_path = dir.path().join("out/lib.json");

        Command::cargo_bin("adorad")
            .expect("binary exists")
            .arg(&input_path)
            .arg("--emit")
            .arg("json")
            .arg("--output")
            .arg(&output_path)
            .assert()
            .success();

        let json = fs::read_to_string(&output_path).expect("read json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["module_name"], "lib");
    }

    #[test]
    fn walks_directories_and_keeps_going_after_errors() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.ad"), "module a").expect("write a");
        fs::write(dir.path().join("b.ad"), "module b\nalias x").expect("write b");
        fs::write(dir.path().join("c.ad"), "module c").expect("write c");

        Command::cargo_bin("adorad")
            .expect("binary exists")
            .arg(dir.path())
            .assert()
            .failure()
            .stdout(predicate::str::contains("(module a)"))
            .stdout(predicate::str::contains("(module c)"))
            .stderr(predicate::str::contains("b.ad:2:8: error[E0100]: expected `as`; found end of file"))
            .stderr(predicate::str::contains("2 | alias x"))
            .stderr(predicate::str::contains("1 of 3 source file(s) failed"));
    }

    #[test]
    fn reports_lex_errors_with_code() {
        Command::cargo_bin("adorad")
            .expect("binary exists")
            .write_stdin("module m\nstring s = \"open\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("<stdin>:2:12: error[E0002]: unterminated string literal"));
    }

    #[test]
    fn reports_missing_paths() {
        let dir = tempdir().expect("tempdir");

        Command::cargo_bin("adorad")
            .expect("binary exists")
            .arg(dir.path().join("missing.ad"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("source path was not found"));
    }

    #[test]
    fn rejects_unknown_emit_format() {
        Command::cargo_bin("adorad")
            .expect("binary exists")
            .args(["--emit", "bytecode"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value 'bytecode'"));
    }
}
