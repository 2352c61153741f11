//! # scriptrs Execution Runtime (`runner`)
//!
//! File: cli/src/runner/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Everything involved in running a command and remembering what happened:
//!
//! - **`history`**: The `HistoryStore`, the authoritative record of every execution
//!   and its output, with a payload-free change signal.
//! - **`registry`**: The `ProcessRegistry`, live handles of in-flight processes.
//! - **`controller`**: The `ExecutionController`, which owns the two above plus the
//!   focused session and drives each execution from spawn to terminal state.
//! - **`display`**: The message contract between the controller and a rendering surface.
//! - **`manifest`**: Reading `package.json` scripts and resolving how to invoke them.
//! - **`script_kind`**: Categorising script names for listings.
//!
//! ## Usage
//!
//! ```rust
//! use crate::runner::controller::{ControllerSettings, ExecutionController};
//! use crate::runner::display::DisplayBridge;
//! use crate::runner::manifest;
//! ```
//!

/// Execution orchestration and the focused session.
pub mod controller;
/// Controller ↔ rendering surface message contract.
pub mod display;
/// In-memory execution records with change notification.
pub mod history;
/// `package.json` scripts and runner conventions.
pub mod manifest;
/// Live process handles keyed by execution id.
pub mod registry;
/// Script name categorisation.
pub mod script_kind;
