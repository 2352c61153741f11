//! # scriptrs Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file serves as the main entry point for the scriptrs CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! - Each top-level command (`list`, `run`, ...) is a variant in the `Commands` enum
//! - Commands are mapped to handler functions in `commands::*`
//! - All errors are propagated to this level for consistent handling
//!
//! Logs go to stderr so they never mix with the output of the commands being run,
//! which is written to stdout.
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! scriptrs --help
//!
//! # Run a script with increased verbosity
//! scriptrs -vv run build
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

// Declare the top-level modules of the CLI crate.
mod commands; // Command-line surface (list, run, exec, session)
mod common; // Shared utilities (process, fs, ui)
mod core; // Core infrastructure (errors, config, i18n)
mod runner; // Execution history, registry and controller

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "scriptrs",
    about = "Run package.json scripts and keep a history of every execution",
    long_about = "Runs package.json scripts (npm, yarn or pnpm) and raw shell commands,\n\
                  streams their output, and keeps an in-memory history of every run.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "ls")]
    List(commands::list::ListArgs),
    #[command(alias = "r")]
    Run(commands::run::RunArgs),
    #[command(alias = "x")]
    Exec(commands::exec::ExecArgs),
    #[command(alias = "s")]
    Session(commands::session::SessionArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::List(args) => commands::list::handle_list(args).await,
        Commands::Run(args) => commands::run::handle_run(args).await,
        Commands::Exec(args) => commands::exec::handle_exec(args).await,
        Commands::Session(args) => commands::session::handle_session(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
