//! # scriptrs Exec Command
//!
//! File: cli/src/commands/exec.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `scriptrs exec -- <COMMAND...>`: runs an arbitrary command line
//! through the configured shell, exactly the way `run` runs a script. Everything
//! after `--` is joined with spaces and handed to the shell, so pipes, `&&` and
//! variable expansion work as typed (quote them to keep your own shell from
//! interpreting them first).
//!
//! ## Usage
//!
//! ```bash
//! scriptrs exec -- ls -la
//! scriptrs exec --name tsc -- 'npx tsc --noEmit && echo ok'
//! scriptrs exec -i -- 'read name; echo "hello $name"'
//! ```
//!
use super::foreground::{resolve_project, run_to_completion};
use crate::core::error::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

/// Arguments for `scriptrs exec`.
#[derive(Parser, Debug)]
#[command(about = "Run a raw shell command")]
pub struct ExecArgs {
    /// Working directory (defaults to the current directory).
    #[arg(long, short)]
    dir: Option<PathBuf>,

    /// Name recorded for the execution (defaults to the command's first word).
    #[arg(long)]
    name: Option<String>,

    /// Forward lines typed on stdin to the running command.
    #[arg(short, long)]
    interactive: bool,

    /// The command line to run, after `--`.
    #[arg(required = true, last = true)]
    command: Vec<String>,
}

/// Handles `scriptrs exec`.
///
/// # Errors
///
/// Fails if the directory does not exist or the execution ends `Failed`.
pub async fn handle_exec(args: ExecArgs) -> Result<()> {
    info!("Handling exec command...");
    debug!("Exec args: {:?}", args);

    let (dir, config) = resolve_project(args.dir.as_deref())?;
    let command = args.command.join(" ");
    run_to_completion(&config, &command, &dir, args.name.as_deref(), args.interactive).await
}
