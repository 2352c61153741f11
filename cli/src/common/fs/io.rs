//! # scriptrs Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module centralizes the small amount of filesystem access scriptrs needs:
//! reading project manifests and probing a project directory for convention
//! marker files (lock files). It provides thin wrappers around `std::fs` that add
//! context to errors and distinguish "missing" from "unreadable".
//!
//! ## Architecture
//!
//! - **`read_file_to_string`**: Reads a whole file, adding the path to any error.
//! - **`read_optional_file`**: Like `read_file_to_string`, but a missing file is `Ok(None)`.
//! - **`first_existing`**: Returns the first of several candidate file names that
//!   exists in a directory, in the order given.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs::io;
//!
//! # fn run_example(dir: &std::path::Path) -> crate::core::error::Result<()> {
//! let manifest = io::read_optional_file(&dir.join("package.json"))?;
//! let lock = io::first_existing(dir, &["pnpm-lock.yaml", "yarn.lock"]);
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::Result;
use anyhow::Context;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the entire content of a file into a string.
///
/// # Errors
///
/// Returns an `Err` if the file cannot be found, opened, or read, with context
/// indicating which file failed.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Reads a file that may legitimately be absent.
///
/// # Returns
///
/// * `Ok(Some(content))` if the file was read.
/// * `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// Returns an `Err` for any other I/O failure (permissions, not valid UTF-8, ...).
pub fn read_optional_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("File not found: {:?}", path);
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read file {:?}", path)),
    }
}

/// Returns the path of the first `candidates` entry that exists as a file in `dir`.
pub fn first_existing(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
