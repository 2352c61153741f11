//! # scriptrs List Command
//!
//! File: cli/src/commands/list.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `scriptrs list`: shows which package manager the project uses and
//! every script declared in its `package.json`, with the script's kind, name and
//! command string.
//!
//! ## Usage
//!
//! ```bash
//! # Scripts of the project in the current directory
//! scriptrs list
//!
//! # Scripts of another project
//! scriptrs list --dir ../web
//! ```
//!
//! Output looks like:
//!
//! ```text
//! Runner: pnpm (/home/me/web)
//!   build  build   vite build
//!   dev    dev     vite
//!   test   test    vitest run
//! ```
//!
use super::foreground::resolve_project;
use crate::core::config::Config;
use crate::core::error::{Result, ScriptrsError};
use crate::runner::manifest::{self, RunnerConvention};
use crate::runner::script_kind::ScriptKind;
use anyhow::anyhow;
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Arguments for `scriptrs list`.
#[derive(Parser, Debug)]
#[command(about = "List the scripts declared in package.json")]
pub struct ListArgs {
    /// Project directory containing package.json (defaults to the current directory).
    #[arg(long, short)]
    dir: Option<PathBuf>,
}

/// Handles `scriptrs list`.
///
/// # Errors
///
/// Fails if the directory does not exist, `package.json` is missing or invalid,
/// or it declares no scripts.
pub async fn handle_list(args: ListArgs) -> Result<()> {
    info!("Handling list command...");
    debug!("List args: {:?}", args);

    let (dir, config) = resolve_project(args.dir.as_deref())?;
    let scripts = load_scripts(&dir)?;
    let convention = convention_for(&config, &dir);

    println!("Runner: {} ({})", convention, dir.display());
    print!("{}", format_scripts(&scripts));
    Ok(())
}

/// Reads the project's scripts, failing when there is nothing to run.
pub(crate) fn load_scripts(dir: &Path) -> Result<BTreeMap<String, String>> {
    let scripts = manifest::read_scripts(dir).ok_or_else(|| {
        anyhow!(ScriptrsError::Manifest(format!(
            "No readable {} in '{}'",
            manifest::MANIFEST_FILE,
            dir.display()
        )))
    })?;
    if scripts.is_empty() {
        return Err(anyhow!(ScriptrsError::NoScripts {
            path: dir.display().to_string(),
        }));
    }
    Ok(scripts)
}

/// The configured convention, or the one detected from lock files.
pub(crate) fn convention_for(config: &Config, dir: &Path) -> RunnerConvention {
    config
        .runner
        .convention
        .unwrap_or_else(|| manifest::detect_runner_convention(dir))
}

/// One aligned line per script: kind, name, command.
pub(crate) fn format_scripts(scripts: &BTreeMap<String, String>) -> String {
    let width = scripts.keys().map(String::len).max().unwrap_or(0);
    scripts
        .iter()
        .map(|(name, command)| {
            format!(
                "  {:<6} {:<width$}  {}\n",
                ScriptKind::detect(name).label(),
                name,
                command,
                width = width
            )
        })
        .collect()
}
