//! # scriptrs Foreground Execution Helpers
//!
//! File: cli/src/commands/foreground.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Plumbing shared by the commands that run something and wait for it
//! (`run`, `exec`) and by the interactive `session`:
//!
//! - **`resolve_project`**: Picks the working directory and loads the merged
//!   configuration for it.
//! - **`Frontend`**: A controller wired to a terminal surface.
//! - **`wait_for`**: Pumps process events until one execution finishes, turning
//!   Ctrl-C into a cancel request and, if asked, stdin lines into process input.
//! - **`Interrupts`**: A Ctrl-C listener installed once, so an interrupt that
//!   arrives between two polls is still delivered.
//! - **`stdin_lines`**: Reads the terminal's stdin on a plain thread and delivers
//!   lines through a channel, so a blocked read never holds up the runtime.
//!
use crate::common::ui::TerminalSurface;
use crate::core::config::{self, Config};
use crate::core::error::{Result, ScriptrsError};
use crate::runner::controller::{ControllerSettings, ExecutionController};
use crate::runner::display::{DisplayBridge, DisplayIntent, DisplayMessage};
use crate::runner::history::ExecutionStatus;
use anyhow::{anyhow, Context};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Determines the project directory and loads its configuration.
///
/// Precedence for the directory: `--dir`, then `[runner] working_dir`, then the
/// current directory. The configuration is looked up from the `--dir` (or current)
/// directory, since that is where a project `.scriptrs.toml` would live.
///
/// # Errors
///
/// Returns an `Err` if the configuration is invalid or the directory does not exist.
pub fn resolve_project(dir: Option<&Path>) -> Result<(PathBuf, Config)> {
    let start = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let config = config::load_config(&start).context("Failed to load scriptrs configuration")?;

    let working_dir = match (dir, config.default_working_dir()) {
        (None, Some(configured)) => configured,
        _ => start,
    };
    if !working_dir.is_dir() {
        return Err(anyhow!(ScriptrsError::FileSystem(format!(
            "Directory '{}' does not exist",
            working_dir.display()
        ))));
    }
    debug!("Resolved working directory: {}", working_dir.display());
    Ok((working_dir, config))
}

/// A controller together with the terminal it renders to.
pub struct Frontend {
    pub controller: ExecutionController,
    pub surface: TerminalSurface<io::Stdout>,
    display_rx: mpsc::UnboundedReceiver<DisplayMessage>,
}

impl Frontend {
    pub fn new(config: &Config) -> Self {
        let (display, display_rx) = DisplayBridge::channel();
        Self {
            controller: ExecutionController::new(ControllerSettings::from_config(config), display),
            surface: TerminalSurface::stdout(),
            display_rx,
        }
    }

    /// Renders everything the controller has sent so far.
    pub fn render(&mut self) {
        self.surface.pump(&mut self.display_rx);
    }

    /// Waits until execution `id` leaves `Running` and returns its final status.
    ///
    /// Ctrl-C cancels the focused execution. With `input` set, each line received
    /// is forwarded to the focused process; the channel closing stops forwarding.
    pub async fn wait_for(
        &mut self,
        id: &str,
        mut input: Option<mpsc::UnboundedReceiver<String>>,
    ) -> ExecutionStatus {
        let mut interrupts = Interrupts::install();
        self.render();
        while self.controller.is_running(id) {
            tokio::select! {
                event = self.controller.next_event() => {
                    if let Some(event) = event {
                        self.controller.handle_event(event);
                    }
                }
                () = interrupts.recv() => {
                    info!(id, "Interrupt received, cancelling");
                    self.controller.handle_intent(DisplayIntent::Cancel);
                }
                line = next_line(&mut input) => {
                    match line {
                        Some(line) => self.controller.handle_intent(DisplayIntent::Input(line)),
                        None => {
                            debug!("Input stream closed");
                            input = None;
                        }
                    }
                }
            }
            self.render();
        }
        self.controller
            .history()
            .get_entry(id)
            .map(|record| record.status)
            .unwrap_or(ExecutionStatus::Failed)
    }
}

/// Ctrl-C notifications from a single signal listener.
///
/// Signals received while nobody is awaiting `recv` are buffered by the listener
/// and reported on the next call.
pub struct Interrupts {
    #[cfg(unix)]
    listener: Option<tokio::signal::unix::Signal>,
    #[cfg(not(unix))]
    listener: Option<tokio::signal::windows::CtrlC>,
}

impl Interrupts {
    /// Installs the listener. If that fails, `recv` never completes.
    pub fn install() -> Self {
        #[cfg(unix)]
        let listener = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt());
        #[cfg(not(unix))]
        let listener = tokio::signal::windows::ctrl_c();

        let listener = match listener {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!("Cannot listen for Ctrl-C: {}", e);
                None
            }
        };
        Self { listener }
    }

    /// Completes once per Ctrl-C.
    pub async fn recv(&mut self) {
        let received = match self.listener.as_mut() {
            Some(listener) => listener.recv().await,
            None => None,
        };
        if received.is_none() {
            self.listener = None;
            std::future::pending::<()>().await;
        }
    }
}

async fn next_line(input: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match input {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Starts a thread that forwards stdin line by line until EOF.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Stopped reading stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Runs `command` to completion in the foreground.
///
/// # Errors
///
/// Returns `ScriptrsError::ExecutionFailed` when the execution ends `Failed`
/// (non-zero exit, spawn failure, or cancellation).
pub async fn run_to_completion(
    config: &Config,
    command: &str,
    working_dir: &Path,
    script_name: Option<&str>,
    interactive: bool,
) -> Result<()> {
    let mut frontend = Frontend::new(config);
    let id = frontend
        .controller
        .start_execution(command, working_dir, script_name, None);
    let input = interactive.then(stdin_lines);
    let status = frontend.wait_for(&id, input).await;
    info!(id = %id, ?status, "Foreground execution finished");

    match status {
        ExecutionStatus::Completed => Ok(()),
        _ => {
            let name = frontend
                .controller
                .history()
                .get_entry(&id)
                .map(|record| record.script_name.clone())
                .unwrap_or_else(|| command.to_string());
            Err(anyhow!(ScriptrsError::ExecutionFailed { name, id }))
        }
    }
}
