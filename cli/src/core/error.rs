//! # scriptrs Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types and error handling mechanisms used throughout
//! the scriptrs application. It provides a consistent approach to error management
//! with detailed error information and context.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `ScriptrsError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover various domains:
//! - Configuration errors
//! - Filesystem and manifest errors
//! - Process spawning and signalling errors
//! - External command failures reported by one-shot runs
//!
//! Subprocess-level failures inside the execution controller never surface as
//! errors; they become terminal transitions in the history. The variants here
//! are raised by the command layer and by the helpers the controller calls.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if scripts.is_empty() {
//!     return Err(ScriptrsError::NoScripts { path: dir.display().to_string() })?;
//! }
//!
//! // Add context to errors using anyhow
//! let content = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read file: {}", path.display()))?;
//! ```
//!
use thiserror::Error;

/// Custom error type for the scriptrs application.
#[derive(Error, Debug)]
pub enum ScriptrsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("No scripts found in package.json at '{path}'.")]
    NoScripts { path: String },

    #[error("Script '{name}' is not declared in package.json.")]
    ScriptNotFound { name: String },

    #[error("Failed to start process: {0}")]
    Spawn(String),

    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("Execution '{name}' did not complete successfully (id: {id}).")]
    ExecutionFailed { name: String, id: String },

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;
