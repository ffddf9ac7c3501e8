//! End-to-end integration tests for the Pact interpreter.
//!
//! Each test feeds a program to the `pact` binary over stdin and asserts
//! on stdout/stderr and the exit status.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

struct Run {
    stdout: String,
    stderr: String,
    success: bool,
}

fn run(source: &str, flags: &[&str]) -> Run {
    let pact = find_pact();
    let mut child = Command::new(&pact)
        .args(flags)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn pact");

    child
        .stdin
        .take()
        .expect("child stdin")
        .write_all(source.as_bytes())
        .expect("failed to write program to stdin");

    let output = child.wait_with_output().expect("failed to wait on pact");
    Run {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
    }
}

fn find_pact() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();

    if path.file_name().map_or(false, |n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }

    let pact = path.join("pact");
    assert!(
        pact.exists(),
        "pact binary not found at {}. Run `cargo build -p pact-cli` first.",
        pact.display()
    );
    pact
}

#[test]
fn simple_assignment_and_output() {
    let out = run("x: 3 + 4\n!: x\n", &[]);
    assert!(out.success, "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "7\n");
}

#[test]
fn local_scope_return() {
    let out = run("y: (@ a': 5 a')\n!: y\n", &[]);
    assert!(out.success, "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "5\n");
}

#[test]
fn cycle_accumulates_countdown() {
    let out = run("n: 3\nr: [n : n - 1]\n!: n\n", &["--globals"]);
    assert!(out.success, "stderr: {}", out.stderr);
    assert!(out.stdout.contains("0\n"));
    assert!(out.stdout.contains("r : [3, 2, 1]"));
}

#[test]
fn condex_if_branch() {
    let out = run("x: 10\ny: (? x : 10 ; 20)\n!: y\n", &[]);
    assert!(out.success, "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "10\n");
}

#[test]
fn condex_else_branch() {
    let out = run("x: 0 - 1\ny: (? x : 10 ; 20)\n!: y\n", &[]);
    assert!(out.success, "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "20\n");
}

#[test]
fn undefined_name_is_fatal() {
    let out = run("!: zzz\n", &[]);
    assert!(!out.success);
    assert!(out.stdout.contains("Undefined global name zzz"));
    assert!(out.stdout.contains("Interpreter Terminated"));
}

#[test]
fn ast_flag_prints_tree_between_rule_lines() {
    let out = run("x: 3 + 4\n", &["--ast"]);
    assert!(out.success, "stderr: {}", out.stderr);
    let rule = "=-=-=-=-=-=-=-=-=-=";
    let rules: Vec<_> = out.stdout.match_indices(rule).collect();
    assert!(rules.len() >= 2, "stdout: {}", out.stdout);
    assert!(out.stdout.contains("[SEQ (0)]"));
}

#[test]
fn unknown_flag_is_silently_ignored() {
    let out = run("x: 1\n!: x\n", &["--bogus"]);
    assert!(out.success, "stderr: {}", out.stderr);
    assert_eq!(out.stdout, "1\n");
}
