//! # scriptrs Manifest & Command Resolution (`runner::manifest`)
//!
//! File: cli/src/runner/manifest.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Everything scriptrs knows about a JavaScript project lives here: which scripts
//! `package.json` declares, which package manager the project uses, and how that
//! package manager spells "run this script".
//!
//! ## Runner Conventions
//!
//! The convention is picked from the lock file found in the project directory,
//! probed in priority order:
//!
//! | Lock file          | Convention | Invocation          |
//! |--------------------|------------|---------------------|
//! | `pnpm-lock.yaml`   | pnpm       | `pnpm run <name>`   |
//! | `yarn.lock`        | yarn       | `yarn <name>`       |
//! | `package-lock.json`| npm        | `npm run <name>`    |
//!
//! Without any lock file the project is treated as npm. A `[runner] convention`
//! entry in the configuration overrides detection (see `commands::run`).
//!
use crate::common::fs::io;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the manifest file read from the project directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Package-manager invocation syntax.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunnerConvention {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl RunnerConvention {
    /// Detection order: the first lock file present wins.
    const DETECTION_ORDER: [RunnerConvention; 3] = [
        RunnerConvention::Pnpm,
        RunnerConvention::Yarn,
        RunnerConvention::Npm,
    ];

    /// Lock file whose presence selects this convention.
    pub fn lock_file(self) -> &'static str {
        match self {
            RunnerConvention::Npm => "package-lock.json",
            RunnerConvention::Yarn => "yarn.lock",
            RunnerConvention::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// Executable name of the package manager.
    pub fn program(self) -> &'static str {
        match self {
            RunnerConvention::Npm => "npm",
            RunnerConvention::Yarn => "yarn",
            RunnerConvention::Pnpm => "pnpm",
        }
    }
}

impl fmt::Display for RunnerConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Reads the `scripts` table of `<dir>/package.json`.
///
/// # Returns
///
/// * `None` if the manifest is missing, unreadable, or not valid JSON.
/// * `Some(empty)` if the manifest has no `scripts` object.
/// * Otherwise every script whose command is a string, sorted by name.
///   Non-string entries are skipped.
pub fn read_scripts(dir: &Path) -> Option<BTreeMap<String, String>> {
    let path = dir.join(MANIFEST_FILE);
    let content = match io::read_optional_file(&path) {
        Ok(Some(content)) => content,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read {:?}: {:#}", path, e);
            return None;
        }
    };

    let manifest: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring invalid manifest {:?}: {}", path, e);
            return None;
        }
    };

    let scripts = match manifest.get("scripts").and_then(Value::as_object) {
        Some(scripts) => scripts
            .iter()
            .filter_map(|(name, command)| {
                command
                    .as_str()
                    .map(|command| (name.clone(), command.to_string()))
            })
            .collect(),
        None => BTreeMap::new(),
    };
    debug!("Read {} script(s) from {:?}", scripts.len(), path);
    Some(scripts)
}

/// Picks the runner convention from the lock files present in `dir`.
pub fn detect_runner_convention(dir: &Path) -> RunnerConvention {
    let candidates = RunnerConvention::DETECTION_ORDER.map(RunnerConvention::lock_file);
    let detected = io::first_existing(dir, &candidates)
        .and_then(|found| {
            RunnerConvention::DETECTION_ORDER
                .into_iter()
                .find(|convention| found.ends_with(convention.lock_file()))
        })
        .unwrap_or_default();
    debug!("Detected runner convention '{}' in {:?}", detected, dir);
    detected
}

/// Shell command line that runs script `name` under `convention`.
pub fn build_command(name: &str, convention: RunnerConvention) -> String {
    match convention {
        RunnerConvention::Npm => format!("npm run {}", name),
        RunnerConvention::Yarn => format!("yarn {}", name),
        RunnerConvention::Pnpm => format!("pnpm run {}", name),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_scripts_missing_manifest() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_scripts(dir.path()), None);
        Ok(())
    }

    #[test]
    fn test_read_scripts_invalid_json() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json")?;
        assert_eq!(read_scripts(dir.path()), None);
        Ok(())
    }

    #[test]
    fn test_read_scripts_without_scripts_table() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(MANIFEST_FILE), r#"{"name": "demo"}"#)?;
        assert_eq!(read_scripts(dir.path()), Some(BTreeMap::new()));
        Ok(())
    }

    #[test]
    fn test_read_scripts_collects_string_commands() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{
                "name": "demo",
                "scripts": {
                    "test": "vitest run",
                    "build": "tsc -p .",
                    "weird": 42
                }
            }"#,
        )?;
        let scripts = read_scripts(dir.path()).unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts["build"], "tsc -p .");
        assert_eq!(scripts["test"], "vitest run");
        // Sorted by name.
        assert_eq!(scripts.keys().next().map(String::as_str), Some("build"));
        Ok(())
    }

    #[test]
    fn test_detect_defaults_to_npm() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(detect_runner_convention(dir.path()), RunnerConvention::Npm);
        Ok(())
    }

    #[test]
    fn test_detect_priority_pnpm_over_yarn_over_npm() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("package-lock.json"), "{}")?;
        assert_eq!(detect_runner_convention(dir.path()), RunnerConvention::Npm);

        fs::write(dir.path().join("yarn.lock"), "")?;
        assert_eq!(detect_runner_convention(dir.path()), RunnerConvention::Yarn);

        fs::write(dir.path().join("pnpm-lock.yaml"), "")?;
        assert_eq!(detect_runner_convention(dir.path()), RunnerConvention::Pnpm);
        Ok(())
    }

    #[test]
    fn test_build_command_per_convention() {
        assert_eq!(build_command("dev", RunnerConvention::Npm), "npm run dev");
        assert_eq!(build_command("dev", RunnerConvention::Yarn), "yarn dev");
        assert_eq!(build_command("dev", RunnerConvention::Pnpm), "pnpm run dev");
    }
}
