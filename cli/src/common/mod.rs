//! # scriptrs Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared building blocks that are not specific to one command:
//!
//! - **`fs`**: Reading manifests and probing for marker files.
//! - **`process`**: Spawning shell commands and turning their I/O and exit into events.
//! - **`ui`**: The terminal rendering surface for the display bridge.
//!
//! Command handlers and the runner import what they need from the submodule directly,
//! e.g. `crate::common::process::spawn_shell`.
//!

/// Utilities for filesystem operations (manifest reads, marker files).
pub mod fs;
/// Spawning and signalling child processes.
pub mod process;
/// Terminal output for the display bridge.
pub mod ui;
