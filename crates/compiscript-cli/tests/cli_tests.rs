//! End-to-end tests for the `compiscriptc` binary: feed source files in,
//! assert on exit codes and the written `.tac`/stdout text (§6 "CLI
//! surface", §8 Scenario S6).

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_compiscriptc"))
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn well_typed_program_exits_zero_and_writes_tac() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "ok.csc", "let x: integer = 10; let y: integer = x + 5; print(y);");

    let output = bin().arg(&src).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(".func main"), "{stdout}");
    assert!(stdout.contains("print %y"), "{stdout}");

    let tac_path = src.with_extension("tac");
    assert!(tac_path.exists());
    assert_eq!(fs::read_to_string(tac_path).unwrap(), stdout);
}

#[test]
fn semantic_errors_exit_one_and_skip_tac() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "bad.csc", "const y: string = 42; z = 5; break;");

    let output = bin().arg(&src).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!src.with_extension("tac").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TypeMismatch"), "{stderr}");
    assert!(stderr.contains("UnknownSymbol"), "{stderr}");
    assert!(stderr.contains("UnboundBreakContinue"), "{stderr}");
}

#[test]
fn missing_file_exits_two() {
    let output = bin().arg("/no/such/file.csc").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn diagnostics_json_flag_emits_parseable_array() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "bad.csc", "z = 5;");

    let output = bin().arg(&src).arg("--emit-diagnostics-json").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: serde_json::Value = serde_json::from_str(&stderr).expect("valid JSON: {stderr}");
    let arr = parsed.as_array().expect("a JSON array");
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["code"], "UnknownSymbol");
}

#[test]
fn output_flag_writes_to_requested_path() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "ok.csc", "print(1);");
    let out_path = dir.path().join("custom.tac");

    let output = bin().arg(&src).arg("-o").arg(&out_path).output().unwrap();
    assert!(output.status.success());
    assert!(out_path.exists());
    assert!(!src.with_extension("tac").exists());
}
