//! # scriptrs Interactive Session
//!
//! File: cli/src/commands/session.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `scriptrs session`: a line-oriented shell over one execution
//! controller. Several scripts can run at once; one of them is *focused* and has
//! its output streamed live, while the others keep recording into history and
//! can be brought back with `show <id>`.
//!
//! ## Commands
//!
//! | Command          | Effect                                                  |
//! |------------------|---------------------------------------------------------|
//! | `scripts`        | List the scripts declared in `package.json`             |
//! | `run <name>`     | Start a script and focus it                             |
//! | `exec <command>` | Start a raw shell command and focus it                  |
//! | `history`        | List every execution, running ones first                |
//! | `show <id>`      | Focus a recorded execution and replay its output        |
//! | `input <text>`   | Send a line to the focused process                      |
//! | `cancel`         | Stop the focused process (also Ctrl-C)                  |
//! | `rm`             | Remove the focused record and detach                    |
//! | `clear`          | Remove every finished record                            |
//! | `help`           | Show this table                                         |
//! | `quit`           | Stop running processes and leave                        |
//!
//! Whenever the number of running or recorded executions changes, a one-line
//! summary is printed.
//!
use super::foreground::{resolve_project, stdin_lines, Frontend, Interrupts};
use super::list::{convention_for, format_scripts, load_scripts};
use crate::core::config::Config;
use crate::core::error::{Result, ScriptrsError};
use crate::core::i18n::{tr, Message};
use crate::runner::display::DisplayIntent;
use crate::runner::history::HistoryStore;
use crate::runner::manifest;
use anyhow::anyhow;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

const HELP: &str = "\
Commands:
  scripts          list package.json scripts
  run <name>       run a script
  exec <command>   run a raw shell command
  history          list executions
  show <id>        focus an execution and replay its output
  input <text>     send a line to the focused process
  cancel           stop the focused process (Ctrl-C)
  rm               remove the focused record
  clear            remove finished records
  help             show this help
  quit             stop running processes and exit
";

/// Arguments for `scriptrs session`.
#[derive(Parser, Debug)]
#[command(about = "Start an interactive session for running and inspecting scripts")]
pub struct SessionArgs {
    /// Project directory containing package.json (defaults to the current directory).
    #[arg(long, short)]
    dir: Option<PathBuf>,
}

/// One parsed session line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Scripts,
    Run(String),
    Exec(String),
    History,
    Show(String),
    Input(String),
    Cancel,
    Remove,
    Clear,
    Help,
    Quit,
    Empty,
}

impl SessionCommand {
    fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let required = |what: &str| -> Result<String> {
            if rest.is_empty() {
                Err(anyhow!(ScriptrsError::ArgumentParsing(format!(
                    "Usage: {} <{}>",
                    word, what
                ))))
            } else {
                Ok(rest.to_string())
            }
        };

        Ok(match word {
            "" => SessionCommand::Empty,
            "scripts" | "ls" => SessionCommand::Scripts,
            "run" => SessionCommand::Run(required("script")?),
            "exec" => SessionCommand::Exec(required("command")?),
            "history" | "h" => SessionCommand::History,
            "show" => SessionCommand::Show(required("id")?),
            // Input may legitimately be an empty line.
            "input" => SessionCommand::Input(rest.to_string()),
            "cancel" => SessionCommand::Cancel,
            "rm" => SessionCommand::Remove,
            "clear" => SessionCommand::Clear,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => {
                return Err(anyhow!(ScriptrsError::ArgumentParsing(format!(
                    "Unknown command '{}'. Type 'help' for a list of commands.",
                    other
                ))))
            }
        })
    }
}

/// State of one interactive session.
struct Session {
    frontend: Frontend,
    config: Config,
    dir: PathBuf,
    last_summary: (usize, usize),
}

impl Session {
    /// Executes one command. Returns `false` when the session should end.
    fn dispatch(&mut self, command: SessionCommand) -> Result<bool> {
        debug!("Session command: {:?}", command);
        let controller = &mut self.frontend.controller;
        match command {
            SessionCommand::Empty => {}
            SessionCommand::Scripts => {
                let scripts = load_scripts(&self.dir)?;
                println!("Runner: {}", convention_for(&self.config, &self.dir));
                print!("{}", format_scripts(&scripts));
            }
            SessionCommand::Run(name) => {
                let scripts = load_scripts(&self.dir)?;
                if !scripts.contains_key(&name) {
                    return Err(anyhow!(ScriptrsError::ScriptNotFound { name }));
                }
                let command = manifest::build_command(&name, convention_for(&self.config, &self.dir));
                let id = controller.start_execution(&command, &self.dir, Some(&name), None);
                println!("[{}]", id);
            }
            SessionCommand::Exec(command) => {
                let id = controller.start_execution(&command, &self.dir, None, None);
                println!("[{}]", id);
            }
            SessionCommand::History => {
                print!("{}", format_history(controller.history(), &self.config));
            }
            SessionCommand::Show(id) => {
                if !controller.inspect(&id) {
                    println!("Unknown execution id '{}'", id);
                }
            }
            SessionCommand::Input(text) => {
                if !controller.forward_input(&text) {
                    println!("No running process is focused.");
                }
            }
            SessionCommand::Cancel => controller.handle_intent(DisplayIntent::Cancel),
            SessionCommand::Remove => controller.handle_intent(DisplayIntent::RemoveCurrent),
            SessionCommand::Clear => {
                controller.clear_history();
                println!("{}", tr(controller.settings().locale, Message::HistoryCleared));
            }
            SessionCommand::Help => print!("{}", HELP),
            SessionCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Prints the running/total line if it differs from the last one shown.
    fn refresh_summary(&mut self) {
        let history = self.frontend.controller.history();
        let summary = (history.running_count(), history.len());
        if summary != self.last_summary {
            self.last_summary = summary;
            let locale = self.frontend.controller.settings().locale;
            println!(
                "-- {}: {} / {} --",
                tr(locale, Message::Running),
                summary.0,
                summary.1
            );
        }
    }

    /// Cancels every execution that is still running.
    fn stop_all(&mut self) {
        let controller = &mut self.frontend.controller;
        let running: Vec<String> = controller
            .history()
            .list()
            .into_iter()
            .filter(|record| record.status.is_running())
            .map(|record| record.id)
            .collect();
        if !running.is_empty() {
            info!("Stopping {} running execution(s)", running.len());
        }
        for id in running {
            controller.inspect(&id);
            controller.cancel();
        }
    }
}

/// One line per record: status, id, start time, command.
fn format_history(history: &HistoryStore, config: &Config) -> String {
    let locale = config.locale();
    let records = history.list();
    if records.is_empty() {
        return "(no executions)\n".to_string();
    }
    records
        .iter()
        .map(|record| {
            format!(
                "  {:<14} {:<28} {}  {}\n",
                record.status.label(locale),
                record.id,
                record.start_time.format("%H:%M:%S"),
                record.command
            )
        })
        .collect()
}

/// Handles `scriptrs session`.
///
/// # Errors
///
/// Fails only if the project directory or configuration cannot be resolved;
/// errors from individual session commands are printed and the session goes on.
pub async fn handle_session(args: SessionArgs) -> Result<()> {
    info!("Handling session command...");
    debug!("Session args: {:?}", args);

    let (dir, config) = resolve_project(args.dir.as_deref())?;
    let mut session = Session {
        frontend: Frontend::new(&config),
        config,
        dir,
        last_summary: (0, 0),
    };
    let mut lines = stdin_lines();
    let mut changes = session.frontend.controller.subscribe();
    let mut interrupts = Interrupts::install();

    println!("scriptrs session in {}", session.dir.display());
    print!("{}", HELP);

    loop {
        tokio::select! {
            event = session.frontend.controller.next_event() => {
                if let Some(event) = event {
                    session.frontend.controller.handle_event(event);
                }
            }
            changed = changes.changed() => {
                if changed.is_ok() {
                    session.refresh_summary();
                }
            }
            () = interrupts.recv() => {
                session.frontend.controller.handle_intent(DisplayIntent::Cancel);
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Stdin closed, ending session");
                    break;
                };
                let keep_going = SessionCommand::parse(&line)
                    .and_then(|command| session.dispatch(command))
                    .unwrap_or_else(|e| {
                        eprintln!("Error: {:#}", e);
                        true
                    });
                if !keep_going {
                    break;
                }
            }
        }
        session.frontend.render();
    }

    session.stop_all();
    session.frontend.render();
    Ok(())
}
