// Each integration test file (`cli_args.rs`, `server_unary.rs`, etc.) is compiled
// as its own independent binary crate, each pulling in its own copy of this module.
// Helpers used by some test binaries but not others trigger false "dead code" warnings
// in the binaries that don't call them. Allow dead_code to silence these per-binary
// false positives.
#![allow(dead_code)]

pub mod server;

use std::path::PathBuf;
use std::process::{Command, Output};

/// Result of running the cfctl binary.
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        RunResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    /// Combined stdout + stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Path to the compiled cfctl binary (set by Cargo for [[bin]] targets).
pub fn cfctl_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cfctl"))
}

/// Run the cfctl binary with the given arguments and the caller's own
/// environment (no `$HOME` override). Only safe for invocations that never
/// touch `$HOME/.cfctl` (`--help`, `--version`, `alias` with no fixture).
pub fn run_bare(args: &[&str]) -> RunResult {
    let output = Command::new(cfctl_bin())
        .args(args)
        .output()
        .expect("failed to execute cfctl binary");
    RunResult::from_output(output)
}

/// Run the cfctl binary with the given arguments against a fixed `$HOME`,
/// so the on-disk config/alias/cache files stay isolated per test.
pub fn run_with_home(home: &std::path::Path, args: &[&str]) -> RunResult {
    let output = Command::new(cfctl_bin())
        .args(args)
        .env("HOME", home)
        .output()
        .expect("failed to execute cfctl binary");
    RunResult::from_output(output)
}

/// Write a minimal `$HOME/.cfctl/config.yml` pointing the active
/// environment at a local fixture server.
pub fn write_config(home: &std::path::Path, endpoint: &str) {
    let dir = home.join(".cfctl");
    std::fs::create_dir_all(&dir).expect("failed to create .cfctl dir");
    let contents = format!(
        "active_environment: test\nenvironments:\n  test:\n    endpoint: \"{endpoint}\"\n    token: null\n    is_proxy: false\naliases: {{}}\n"
    );
    std::fs::write(dir.join("config.yml"), contents).expect("failed to write config.yml");
}

// -- Assertion helpers --------------------------------------------------------

/// Assert the exit code matches.
pub fn assert_exit_code(result: &RunResult, expected: i32) {
    assert_eq!(
        result.exit_code, expected,
        "Expected exit code {expected}, got {}.\nstdout: {}\nstderr: {}",
        result.exit_code, result.stdout, result.stderr,
    );
}

/// Assert stdout contains a substring.
pub fn assert_stdout_contains(result: &RunResult, needle: &str) {
    assert!(
        result.stdout.contains(needle),
        "Expected stdout to contain {needle:?}.\nstdout: {}\nstderr: {}",
        result.stdout,
        result.stderr,
    );
}

/// Assert combined output (stdout+stderr) contains a substring (case-insensitive).
pub fn assert_output_contains(result: &RunResult, needle: &str) {
    let combined = result.combined().to_lowercase();
    assert!(
        combined.contains(&needle.to_lowercase()),
        "Expected output to contain {needle:?} (case-insensitive).\nstdout: {}\nstderr: {}",
        result.stdout,
        result.stderr,
    );
}

/// Assert combined output does NOT contain a substring.
pub fn assert_output_not_contains(result: &RunResult, needle: &str) {
    let combined = result.combined();
    assert!(
        !combined.contains(needle),
        "Expected output NOT to contain {needle:?}.\nstdout: {}\nstderr: {}",
        result.stdout,
        result.stderr,
    );
}
