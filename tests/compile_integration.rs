// tests/compile_integration.rs
//! End-to-end tests driving the spinel binary.
//!
//! Compilation tests need nasm and ld on PATH; they skip (pass
//! vacuously) when the toolchain is missing so the suite stays runnable
//! on machines without it. check/inspect tests have no such dependency.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn spinel(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spinel"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run spinel")
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("failed to write test source");
    path
}

fn toolchain_available() -> bool {
    let probe = |tool: &str, flag: &str| {
        Command::new(tool)
            .arg(flag)
            .output()
            .is_ok_and(|output| output.status.success())
    };
    probe("nasm", "-v") && probe("ld", "--version")
}

/// Compile `source` in a scratch directory and run the executable,
/// returning its exit code. None when nasm/ld are unavailable.
fn compile_and_run(source: &str) -> Option<i32> {
    if !toolchain_available() {
        eprintln!("skipping: nasm/ld not on PATH");
        return None;
    }
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = write_source(&dir, "main.spn", source);
    let output_path = dir.path().join("a.out");

    let output = spinel(
        &[
            "compile",
            input.to_str().unwrap(),
            output_path.to_str().unwrap(),
        ],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let run = Command::new(&output_path)
        .output()
        .expect("failed to run compiled executable");
    run.status.code()
}

#[test]
fn exit_status_round_trips() {
    let Some(code) = compile_and_run("syscall(60, 42);") else {
        return;
    };
    assert_eq!(code, 42);
}

#[test]
fn function_calls_pass_arguments_and_return_values() {
    let source = "\
function add(a: s32, b: s32): s32 {
  return a + b;
}
syscall(60, add(2, 3));
";
    let Some(code) = compile_and_run(source) else {
        return;
    };
    assert_eq!(code, 5);
}

#[test]
fn conditionals_pick_the_right_branch() {
    let source = "\
function pick(n: s32): s32 {
  if (n < 5) { return 7; } else { return 9; }
}
syscall(60, pick(3));
";
    let Some(code) = compile_and_run(source) else {
        return;
    };
    assert_eq!(code, 7);
}

#[test]
fn imported_modules_run_before_the_root() {
    if !toolchain_available() {
        eprintln!("skipping: nasm/ld not on PATH");
        return;
    }
    let dir = TempDir::new().expect("failed to create temp dir");
    write_source(
        &dir,
        "sys.spn",
        "export function exit(status: s32) { syscall(60, status); }",
    );
    let input = write_source(
        &dir,
        "main.spn",
        "import { exit } from './sys.spn';\nexit(42);",
    );
    let output_path = dir.path().join("a.out");

    let output = spinel(
        &[
            "compile",
            input.to_str().unwrap(),
            output_path.to_str().unwrap(),
        ],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let run = Command::new(&output_path)
        .output()
        .expect("failed to run compiled executable");
    assert_eq!(run.status.code(), Some(42));
}

#[test]
fn compile_errors_print_a_location_line() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = write_source(&dir, "main.spn", "syscall(60, undefined);");
    let output_path = dir.path().join("a.out");

    let output = spinel(
        &[
            "compile",
            input.to_str().unwrap(),
            output_path.to_str().unwrap(),
        ],
        dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let expected = format!("{}:1:13: ", input.display());
    assert!(
        stderr.contains(&expected),
        "stderr missing '{expected}': {stderr}"
    );
    assert!(!output_path.exists());
}

#[test]
fn check_accepts_a_valid_program() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = write_source(&dir, "ok.spn", "syscall(60, 0);");
    let output = spinel(&["check", input.to_str().unwrap()], dir.path());
    assert!(
        output.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn check_rejects_and_renders_the_diagnostic() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = write_source(&dir, "bad.spn", "syscall(60, nope);");
    let output = spinel(&["check", input.to_str().unwrap()], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    // both the stable one-liner and the rich report
    assert!(stderr.contains("bad.spn:1:13:"), "{stderr}");
    assert!(stderr.contains("E2001"), "{stderr}");
}

#[test]
fn missing_input_fails_without_panicking() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let output = spinel(&["check", "no_such_file.spn"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no_such_file.spn"), "{stderr}");
}

#[test]
fn inspect_prints_the_instruction_listing() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = write_source(&dir, "main.spn", "syscall(60, 0);");
    let output = spinel(&["inspect", input.to_str().unwrap()], dir.path());
    assert!(
        output.status.success(),
        "inspect failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("prologue fmodule0"), "{stdout}");
    assert!(stdout.contains("syscall 2"), "{stdout}");
    assert!(stdout.contains("epilogue"), "{stdout}");
}
