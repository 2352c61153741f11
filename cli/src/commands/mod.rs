//! # scriptrs Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the top-level commands of the scriptrs CLI and makes
//! them accessible to the main application entry point (`main.rs`).
//!
//! ## Commands
//!
//! - `list`: Show the project's package manager and declared scripts
//! - `run`: Run one declared script in the foreground
//! - `exec`: Run a raw shell command in the foreground
//! - `session`: Interactive shell for running, inspecting and cancelling executions
//!
//! Each command defines its own arguments structure and an async `handle_*`
//! function. The shared `foreground` module wires a controller to the terminal
//! for all of them.
//!

/// `scriptrs exec -- <COMMAND...>`.
pub mod exec;
/// Project resolution and the controller ↔ terminal loop used by every command.
pub mod foreground;
/// `scriptrs list`.
pub mod list;
/// `scriptrs run <SCRIPT>`.
pub mod run;
/// `scriptrs session`.
pub mod session;
