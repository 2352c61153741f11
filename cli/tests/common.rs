//! # scriptrs CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and pulls in what it needs.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;

/// # Get scriptrs Command (`scriptrs_cmd`)
///
/// An `assert_cmd::Command` for the compiled `scriptrs` binary, isolated from the
/// developer's own setup: the user configuration directory points nowhere and the
/// locale is forced to English so banners are predictable.
///
/// ## Panics
/// Panics if the `scriptrs` binary cannot be found via `Command::cargo_bin`.
pub fn scriptrs_cmd() -> Command {
    let mut cmd =
        Command::cargo_bin("scriptrs").expect("Failed to find scriptrs binary for testing");
    cmd.env("XDG_CONFIG_HOME", "/nonexistent/scriptrs-test-config")
        .env("LANG", "C")
        .env_remove("RUST_LOG");
    cmd
}

/// Writes a `package.json` declaring `scripts` into `dir`.
pub fn write_manifest(dir: &Path, scripts: &[(&str, &str)]) {
    let entries: Vec<String> = scripts
        .iter()
        .map(|(name, command)| format!("    \"{}\": \"{}\"", name, command))
        .collect();
    let manifest = format!(
        "{{\n  \"name\": \"fixture\",\n  \"scripts\": {{\n{}\n  }}\n}}\n",
        entries.join(",\n")
    );
    fs::write(dir.join("package.json"), manifest).expect("Failed to write package.json");
}

/// Whether `program` can be started from the test environment.
pub fn program_available(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
