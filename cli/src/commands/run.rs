//! # scriptrs Run Command
//!
//! File: cli/src/commands/run.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `scriptrs run <SCRIPT>`: looks the script up in `package.json`,
//! builds the invocation for the project's package manager (`npm run build`,
//! `yarn build`, `pnpm run build`) and runs it in the foreground, streaming its
//! output as it arrives.
//!
//! ## Behavior
//!
//! - Exits with status 0 when the script completes successfully, non-zero otherwise.
//! - Ctrl-C stops the script (interrupt first, terminate as a fallback) and counts as a failure.
//! - With `-i`, every line typed on stdin is forwarded to the script.
//!
//! ## Usage
//!
//! ```bash
//! scriptrs run build
//! scriptrs run dev --dir ./frontend
//! scriptrs run init -i   # answer the script's prompts
//! ```
//!
use super::foreground::{resolve_project, run_to_completion};
use super::list::{convention_for, load_scripts};
use crate::core::error::{Result, ScriptrsError};
use crate::runner::manifest;
use anyhow::anyhow;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

/// Arguments for `scriptrs run`.
#[derive(Parser, Debug)]
#[command(about = "Run a script declared in package.json")]
pub struct RunArgs {
    /// Name of the script, as declared under "scripts".
    #[arg(required = true)]
    script: String,

    /// Project directory containing package.json (defaults to the current directory).
    #[arg(long, short)]
    dir: Option<PathBuf>,

    /// Forward lines typed on stdin to the running script.
    #[arg(short, long)]
    interactive: bool,
}

/// Handles `scriptrs run`.
///
/// # Errors
///
/// Fails if the manifest cannot be read, the script is not declared, or the
/// execution ends `Failed`.
pub async fn handle_run(args: RunArgs) -> Result<()> {
    info!("Handling run command for script '{}'...", args.script);
    debug!("Run args: {:?}", args);

    let (dir, config) = resolve_project(args.dir.as_deref())?;
    let scripts = load_scripts(&dir)?;
    if !scripts.contains_key(&args.script) {
        return Err(anyhow!(ScriptrsError::ScriptNotFound {
            name: args.script.clone(),
        }));
    }

    let convention = convention_for(&config, &dir);
    let command = manifest::build_command(&args.script, convention);
    debug!("Resolved '{}' to '{}'", args.script, command);

    run_to_completion(&config, &command, &dir, Some(&args.script), args.interactive).await
}
