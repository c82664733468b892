//! Command-line driver for the Compiscript pipeline (§6 "CLI surface"):
//! parse a source file, check it, and lower it to TAC text when the check
//! is clean. `anyhow` is used only here, at the binary's outermost edge, to
//! unify error reporting into a single readable chain — every library
//! crate below this one returns `Result`/pushes diagnostics instead of
//! panicking.

mod cli_error;

use anyhow::{Context, Result};
use clap::Parser;
use cli_error::CliError;
use compiscript_common::{Diagnostic, DiagnosticBag, LineMap, Severity};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// The Compiscript compiler: parse, check, and lower a source file to TAC.
#[derive(Parser, Debug)]
#[command(name = "compiscriptc", version, about = "Compiscript to three-address code compiler")]
struct Args {
    /// Path to a `.csc` source file.
    source: PathBuf,

    /// Write the TAC text to this path instead of (or in addition to) stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit diagnostics as a JSON array on stderr instead of human-readable text.
    #[arg(long = "emit-diagnostics-json")]
    emit_diagnostics_json: bool,

    /// Raise the tracing verbosity (stackable: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct JsonDiagnostic {
    severity: &'static str,
    code: &'static str,
    message: String,
    line: u32,
    column: u32,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let default_filter = match verbose {
        0 => "compiscript_cli=info",
        1 => "compiscript_cli=debug,compiscript_checker=debug,compiscript_tac=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Runs the pipeline. `Ok(true)` means compilation succeeded (exit 0),
/// `Ok(false)` means semantic errors were reported (exit 1); a usage or I/O
/// failure surfaces as `Err` (exit 2), per §6.
fn run(args: &Args) -> Result<bool> {
    let source = fs::read_to_string(&args.source)
        .with_context(|| CliError::ReadSource { path: args.source.clone() })?;
    tracing::info!(path = %args.source.display(), bytes = source.len(), "read source");

    let (program, parse_diags) = compiscript_parser::parse(&source);
    if parse_diags.has_errors() {
        report(&source, &args.source, parse_diags, args.emit_diagnostics_json);
        return Ok(false);
    }

    tracing::info!("parsed source, checking");
    let (_table, check_diags) = compiscript_checker::check(&program);
    if check_diags.has_errors() {
        report(&source, &args.source, check_diags, args.emit_diagnostics_json);
        return Ok(false);
    }
    if !check_diags.is_empty() {
        report(&source, &args.source, check_diags, args.emit_diagnostics_json);
    }

    tracing::info!("checked source, generating TAC");
    let program_tac = compiscript_tac::generate(&program).context(CliError::Generate)?;
    let text = program_tac.to_text();

    match &args.output {
        Some(path) => {
            fs::write(path, &text).with_context(|| CliError::WriteOutput { path: path.clone() })?;
            tracing::info!(path = %path.display(), "wrote TAC output");
        }
        None => {
            let default_path = args.source.with_extension("tac");
            fs::write(&default_path, &text).with_context(|| CliError::WriteOutput { path: default_path.clone() })?;
            tracing::info!(path = %default_path.display(), "wrote TAC output");
        }
    }
    print!("{text}");
    Ok(true)
}

fn report(source: &str, source_path: &Path, diags: DiagnosticBag, as_json: bool) {
    if as_json {
        let map = LineMap::build(source);
        let rendered: Vec<JsonDiagnostic> = diags
            .iter()
            .map(|d| {
                let pos = map.offset_to_position(d.span.start);
                JsonDiagnostic {
                    severity: severity_str(d.severity),
                    code: d.code.as_str(),
                    message: d.message.clone(),
                    line: pos.line,
                    column: pos.column,
                }
            })
            .collect();
        match serde_json::to_string_pretty(&rendered) {
            Ok(json) => eprintln!("{json}"),
            Err(err) => eprintln!("error: failed to serialize diagnostics: {err}"),
        }
        return;
    }

    let map = LineMap::build(source);
    for d in diags.iter() {
        print_diagnostic(source_path, &map, d);
    }
}

fn print_diagnostic(source_path: &Path, map: &LineMap, d: &Diagnostic) {
    let pos = map.offset_to_position(d.span.start);
    let label = severity_str(d.severity);
    eprintln!("{}:{pos}: {label}[{}]: {}", source_path.display(), d.code, d.message);
}

fn severity_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}
