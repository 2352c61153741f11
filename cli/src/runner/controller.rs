//! # scriptrs Execution Controller (`runner::controller`)
//!
//! File: cli/src/runner/controller.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The controller is the only stateful orchestrator in scriptrs. It owns the
//! [`HistoryStore`], the [`ProcessRegistry`], the [`FocusedSession`] and the
//! sending half of the [`DisplayBridge`], and it drives every execution through
//! its lifecycle:
//!
//! ```text
//! Spawning ──spawn ok──▶ Running ──exit 0──────▶ Completed
//!    │                     │
//!    └──spawn error──▶ Failed ◀──exit ≠ 0 / cancel──┘
//! ```
//!
//! Terminal states are absorbing.
//!
//! ## Architecture
//!
//! Child processes report through `common::process`, which turns their pipes
//! and exit into [`ProcessEvent`]s on one channel. The controller holds the
//! receiving end; a front-end loop calls [`ExecutionController::next_event`] and
//! hands each event back to [`ExecutionController::handle_event`]. All mutation
//! therefore happens on whichever task owns the controller, one event at a time,
//! with no locks.
//!
//! ## Output Attribution
//!
//! Every chunk is stored under the id of the process that produced it. Only
//! chunks from the focused id are relayed to the display; output of a process
//! that lost focus keeps accumulating in history and is shown again when that
//! record is loaded with [`ExecutionController::load_session`].
//!
//! ## Usage
//!
//! ```rust
//! let (display, mut surface_rx) = DisplayBridge::channel();
//! let mut controller = ExecutionController::new(ControllerSettings::from_config(&config), display);
//! let id = controller.start_execution("npm run build", &dir, Some("build"), None);
//! while controller.is_running(&id) {
//!     if let Some(event) = controller.next_event().await {
//!         controller.handle_event(event);
//!     }
//! }
//! ```
//!
use crate::common::process::{self, ProcessEvent, ShellCommand};
use crate::core::config::Config;
use crate::core::i18n::{tr, Locale, Message};
use crate::runner::display::{DisplayBridge, DisplayIntent};
use crate::runner::history::HistoryStore;
use crate::runner::registry::{ProcessHandle, ProcessRegistry};
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Script name used for raw commands that were not given one.
const DEFAULT_SCRIPT_NAME: &str = "exec";

/// Launch and presentation settings, resolved once from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub shell: String,
    pub shell_arg: String,
    pub locale: Locale,
    /// Whether start and terminal banners are written.
    pub banners: bool,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            shell: config.runner.shell.clone(),
            shell_arg: config.runner.shell_arg.clone(),
            locale: config.locale(),
            banners: config.display.banners,
        }
    }
}

/// The one execution currently attached to the live display.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusedSession {
    pub id: Option<String>,
    pub script_name: Option<String>,
}

/// Orchestrates executions; see the module documentation.
#[derive(Debug)]
pub struct ExecutionController {
    history: HistoryStore,
    registry: ProcessRegistry,
    display: DisplayBridge,
    focus: FocusedSession,
    settings: ControllerSettings,
    events_tx: mpsc::UnboundedSender<ProcessEvent>,
    events_rx: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl ExecutionController {
    pub fn new(settings: ControllerSettings, display: DisplayBridge) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            history: HistoryStore::new(),
            registry: ProcessRegistry::new(),
            display,
            focus: FocusedSession::default(),
            settings,
            events_tx,
            events_rx,
        }
    }

    /// Starts `command` in `working_dir` through the configured shell and
    /// returns the execution id.
    ///
    /// The history record exists, and focus has moved to it, before the process
    /// is spawned. The call returns as soon as the spawn was attempted; a spawn
    /// failure is recorded as a `Failed` execution rather than returned.
    ///
    /// `script_name` defaults to the command's first word. A supplied `id` that
    /// was already issued is made unique, so always use the returned id.
    #[instrument(skip(self, working_dir), fields(dir = %working_dir.display()))]
    pub fn start_execution(
        &mut self,
        command: &str,
        working_dir: &Path,
        script_name: Option<&str>,
        id: Option<&str>,
    ) -> String {
        let script_name = script_name
            .map(str::to_string)
            .or_else(|| command.split_whitespace().next().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string());

        let id = self
            .history
            .add_running(&script_name, command, working_dir, id);

        self.display.reveal();
        self.display.clear();
        self.focus = FocusedSession {
            id: Some(id.clone()),
            script_name: Some(script_name.clone()),
        };
        self.display.set_live_controls(true);

        if self.settings.banners {
            let banner = format!("{}: {}\n", self.text(Message::Executing), command);
            self.record_output(&id, &banner);
        }

        let spec = ShellCommand::new(
            &self.settings.shell,
            &self.settings.shell_arg,
            command,
            working_dir,
        );
        match process::spawn_shell(&id, &spec, self.events_tx.clone()) {
            Ok(spawned) => {
                info!(id = %id, pid = ?spawned.pid, "Execution started");
                self.registry
                    .register(&id, ProcessHandle::new(&script_name, spawned));
            }
            Err(e) => {
                warn!(id = %id, "Execution could not start: {:#}", e);
                let banner = format!("{}: {:#}\n", self.text(Message::Error), e);
                if self.is_focused(&id) {
                    self.display.set_live_controls(false);
                }
                self.record_output(&id, &banner);
                self.history.mark_terminal_by_id(&id, false);
            }
        }
        id
    }

    /// Waits for the next event from any running child.
    ///
    /// Never yields `None` while the controller is alive, since it keeps a
    /// sender of its own; with nothing running it simply stays pending.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events_rx.recv().await
    }

    /// Applies one child event to history, registry and display.
    pub fn handle_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Output { id, text, .. } => self.record_output(&id, &text),
            ProcessEvent::Exited { id, code } => self.finish(&id, code),
        }
    }

    /// Terminal transition for a process that exited on its own.
    fn finish(&mut self, id: &str, code: Option<i32>) {
        if self.registry.unregister(id).is_none() {
            // Cancelled earlier; its terminal state is already recorded.
            debug!(id, ?code, "Ignoring exit of an unregistered process");
            return;
        }
        let success = code == Some(0);
        if self.is_focused(id) {
            self.display.set_live_controls(false);
        }
        if self.settings.banners {
            let banner = self.terminal_banner(code, success);
            self.record_output(id, &banner);
        }
        self.history.mark_terminal_by_id(id, success);
    }

    /// Stops the focused execution, best effort, and records it as `Failed`.
    ///
    /// An interrupt is tried first and a terminate signal second. If neither
    /// can be delivered, the failure is written to the output and the
    /// execution is still considered stopped. No-op when the focused id has no
    /// registered process.
    pub fn cancel(&mut self) {
        let Some(id) = self.focus.id.clone() else {
            return;
        };
        let Some(mut handle) = self.registry.unregister(&id) else {
            debug!(id = %id, "Cancel requested but no process is registered");
            return;
        };

        if let Err(interrupt_err) = handle.interrupt() {
            debug!(id = %id, "Interrupt failed, escalating: {:#}", interrupt_err);
            if let Err(terminate_err) = handle.terminate() {
                warn!(id = %id, "Could not signal process: {:#}", terminate_err);
                let notice = format!("{}: {:#}\n", self.text(Message::Error), terminate_err);
                self.record_output(&id, &notice);
            }
        }
        info!(id = %id, script = handle.script_name(), "Execution cancelled");

        self.display.set_live_controls(false);
        let notice = format!("\n{}\n", self.text(Message::ProcessStopped));
        self.record_output(&id, &notice);
        self.history.mark_terminal_by_id(&id, false);
    }

    /// Sends `text` plus a newline to the focused process's stdin. Returns
    /// whether it was queued; without a live focused process nothing happens.
    pub fn forward_input(&self, text: &str) -> bool {
        let Some(id) = self.focus.id.as_deref() else {
            return false;
        };
        match self.registry.get(id) {
            Some(handle) => handle.write_input(&format!("{}\n", text)),
            None => false,
        }
    }

    /// Attaches the display to `id` and replays `output` into it. Input and
    /// cancel are enabled only when `is_running` says the record is live.
    /// The process registry is not consulted.
    pub fn load_session(
        &mut self,
        output: &str,
        id: &str,
        is_running: bool,
        script_name: Option<&str>,
    ) {
        debug!(id, is_running, "Loading session");
        self.focus = FocusedSession {
            id: Some(id.to_string()),
            script_name: script_name.map(str::to_string),
        };
        self.display.reveal();
        self.display.clear();
        self.display.append(output);
        self.display.set_live_controls(is_running);
    }

    /// Loads a stored record with [`Self::load_session`]. Returns `false` for
    /// unknown ids.
    pub fn inspect(&mut self, id: &str) -> bool {
        let Some(record) = self.history.get_entry(id) else {
            return false;
        };
        let output = record.output.clone();
        let is_running = record.status.is_running();
        let script_name = record.script_name.clone();
        self.load_session(&output, id, is_running, Some(&script_name));
        true
    }

    /// Drops the focused record from history and detaches the display.
    ///
    /// A process still running under that id keeps running; only its record
    /// disappears.
    pub fn clear_and_detach(&mut self) {
        if let Some(id) = self.focus.id.take() {
            self.history.remove_entry(&id);
        }
        self.focus = FocusedSession::default();
        self.display.clear();
        self.display.disable_all_controls();
    }

    /// Removes every finished record. Detaches the display if the focused
    /// record was among them.
    pub fn clear_history(&mut self) {
        self.history.clear();
        let focus_gone = self
            .focus
            .id
            .as_deref()
            .is_some_and(|id| !self.history.has_entry(id));
        if focus_gone {
            self.focus = FocusedSession::default();
            self.display.clear();
            self.display.disable_all_controls();
        }
    }

    /// Dispatches a request coming back from the rendering surface.
    pub fn handle_intent(&mut self, intent: DisplayIntent) {
        match intent {
            DisplayIntent::Input(text) => {
                if !self.forward_input(&text) {
                    debug!("Input dropped: no live focused process");
                }
            }
            DisplayIntent::Cancel => self.cancel(),
            DisplayIntent::RemoveCurrent => self.clear_and_detach(),
        }
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.history
            .get_entry(id)
            .is_some_and(|record| record.status.is_running())
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn focused(&self) -> &FocusedSession {
        &self.focus
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Change signal of the underlying history store.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.history.subscribe()
    }

    fn is_focused(&self, id: &str) -> bool {
        self.focus.id.as_deref() == Some(id)
    }

    /// Appends to the record under `id`; relays to the display only while
    /// `id` is focused.
    fn record_output(&mut self, id: &str, text: &str) {
        self.history.append_output(id, text);
        if self.is_focused(id) {
            self.display.append(text);
        }
    }

    fn terminal_banner(&self, code: Option<i32>, success: bool) -> String {
        match code {
            Some(code) if success => {
                format!("\n{} {}\n", self.text(Message::ProcessCompleted), code)
            }
            Some(code) => format!("\n{} {}\n", self.text(Message::ProcessTerminated), code),
            None => format!("\n{}\n", self.text(Message::ProcessSignalled)),
        }
    }

    fn text(&self, message: Message) -> &'static str {
        tr(self.settings.locale, message)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::display::{DisplayMessage, DisplayState};
    use crate::runner::history::ExecutionStatus;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    fn settings() -> ControllerSettings {
        ControllerSettings {
            shell: "sh".to_string(),
            shell_arg: "-c".to_string(),
            locale: Locale::En,
            banners: true,
        }
    }

    fn controller() -> (ExecutionController, mpsc::UnboundedReceiver<DisplayMessage>) {
        let (display, rx) = DisplayBridge::channel();
        (ExecutionController::new(settings(), display), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<DisplayMessage>) -> Vec<DisplayMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn shown_text(messages: &[DisplayMessage]) -> String {
        messages
            .iter()
            .filter_map(|m| match m {
                DisplayMessage::Append(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Pumps events until every listed id has left `Running`.
    async fn settle(controller: &mut ExecutionController, ids: &[&str]) {
        while ids.iter().any(|id| controller.is_running(id)) {
            let event = timeout(Duration::from_secs(10), controller.next_event())
                .await
                .expect("timed out waiting for process events")
                .expect("event channel closed");
            controller.handle_event(event);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_completes_with_banner() {
        let dir = TempDir::new().unwrap();
        let (mut controller, mut rx) = controller();

        let id = controller.start_execution("echo hi", dir.path(), Some("greet"), None);
        assert!(!id.is_empty());
        assert_eq!(
            controller.history().get_entry(&id).unwrap().status,
            ExecutionStatus::Running
        );
        assert!(controller.registry().contains(&id));

        settle(&mut controller, &[&id]).await;

        let record = controller.history().get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert!(record.end_time.is_some());
        assert!(record.output.starts_with("Executing: echo hi\n"));
        assert!(record.output.contains("hi\n"));
        assert!(record.output.contains("Process completed with code 0"));
        assert!(!controller.registry().contains(&id));

        let messages = drain(&mut rx);
        assert_eq!(messages[0], DisplayMessage::Reveal);
        assert_eq!(messages[1], DisplayMessage::Clear);
        assert_eq!(shown_text(&messages), record.output);

        let mut state = DisplayState::default();
        messages.iter().for_each(|m| state.apply(m));
        assert!(!state.input_enabled && !state.cancel_enabled && state.removable_enabled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_fails() {
        let dir = TempDir::new().unwrap();
        let (mut controller, _rx) = controller();

        let id = controller.start_execution("echo oops 1>&2; exit 2", dir.path(), None, None);
        settle(&mut controller, &[&id]).await;

        let record = controller.history().get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert_eq!(record.script_name, "echo");
        assert!(record.output.contains("oops"));
        assert!(record.output.contains("Process terminated with code 2"));
    }

    #[tokio::test]
    async fn test_spawn_failure_resolves_to_failed() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let (mut controller, mut rx) = controller();

        let id = controller.start_execution("echo hi", &missing, Some("broken"), None);

        let record = controller.history().get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert!(record.end_time.is_some());
        assert!(record.output.contains("Error: Failed to start process"));
        assert!(!controller.registry().contains(&id));

        let mut state = DisplayState::default();
        drain(&mut rx).iter().for_each(|m| state.apply(m));
        assert!(!state.input_enabled && !state.cancel_enabled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_banners_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let (display, _rx) = DisplayBridge::channel();
        let mut controller = ExecutionController::new(
            ControllerSettings {
                banners: false,
                ..settings()
            },
            display,
        );
        let id = controller.start_execution("true", dir.path(), None, None);
        settle(&mut controller, &[&id]).await;
        assert_eq!(controller.history().get_output(&id), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_records_failure_and_ignores_late_exit() {
        let dir = TempDir::new().unwrap();
        let (mut controller, mut rx) = controller();

        let id = controller.start_execution("sleep 30", dir.path(), Some("longrun"), None);
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.cancel();

        let record = controller.history().get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert!(record.output.contains("Process stopped by user"));
        assert!(!controller.registry().contains(&id));

        let mut state = DisplayState::default();
        drain(&mut rx).iter().for_each(|m| state.apply(m));
        assert!(!state.input_enabled && !state.cancel_enabled);

        // A second cancel has nothing to act on.
        let before = controller.history().get_output(&id).to_string();
        controller.cancel();
        assert_eq!(controller.history().get_output(&id), before);

        // The exit caused by the interrupt arrives later and changes nothing.
        loop {
            let event = timeout(Duration::from_secs(10), controller.next_event())
                .await
                .expect("timed out waiting for exit")
                .expect("event channel closed");
            let exited = matches!(event, ProcessEvent::Exited { .. });
            controller.handle_event(event);
            if exited {
                break;
            }
        }
        let record = controller.history().get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert!(!record.output.contains("Process terminated"));
        assert!(!record.output.contains("Process completed"));
    }

    #[tokio::test]
    async fn test_cancel_without_focus_is_noop() {
        let (mut controller, mut rx) = controller();
        controller.cancel();
        assert!(controller.history().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unfocused_output_is_stored_but_not_shown() {
        let dir = TempDir::new().unwrap();
        let (mut controller, mut rx) = controller();

        // Markers are assembled by printf so they never appear in the banners.
        let x = controller.start_execution(
            "sleep 0.3; printf 'LATE%s\\n' -X",
            dir.path(),
            Some("x"),
            None,
        );
        let y = controller.start_execution("printf 'NOW%s\\n' -Y", dir.path(), Some("y"), None);
        assert_eq!(controller.focused().id.as_deref(), Some(y.as_str()));
        assert_eq!(controller.registry().len(), 2);

        settle(&mut controller, &[&x, &y]).await;

        assert!(controller.history().get_output(&x).contains("LATE-X"));
        assert!(controller.history().get_output(&y).contains("NOW-Y"));
        assert!(!controller.history().get_output(&y).contains("LATE-X"));

        let shown = shown_text(&drain(&mut rx));
        assert!(shown.contains("NOW-Y"));
        assert!(!shown.contains("LATE-X"));

        // Re-attaching replays the stored output.
        assert!(controller.inspect(&x));
        let replayed = shown_text(&drain(&mut rx));
        assert!(replayed.contains("LATE-X"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forward_input_reaches_focused_process() {
        let dir = TempDir::new().unwrap();
        let (mut controller, _rx) = controller();

        let id = controller.start_execution("read line; echo \"got $line\"", dir.path(), None, None);
        assert!(controller.forward_input("abc"));
        settle(&mut controller, &[&id]).await;

        assert!(controller.history().get_output(&id).contains("got abc"));
        assert!(!controller.forward_input("too late"));
    }

    #[tokio::test]
    async fn test_load_session_sets_focus_and_controls() {
        let (mut controller, mut rx) = controller();

        controller.load_session("old output\n", "build-1", true, Some("build"));
        assert_eq!(controller.focused().id.as_deref(), Some("build-1"));
        assert_eq!(controller.focused().script_name.as_deref(), Some("build"));

        let messages = drain(&mut rx);
        assert!(messages.contains(&DisplayMessage::Clear));
        assert_eq!(shown_text(&messages), "old output\n");
        let mut state = DisplayState::default();
        messages.iter().for_each(|m| state.apply(m));
        assert!(state.input_enabled && state.cancel_enabled);

        controller.load_session("", "build-0", false, None);
        drain(&mut rx).iter().for_each(|m| state.apply(m));
        assert!(!state.input_enabled && !state.cancel_enabled && state.removable_enabled);

        // Nothing is registered for a loaded session.
        assert!(!controller.forward_input("ignored"));
        assert!(!controller.inspect("unknown"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clear_and_detach_removes_focused_record_only() {
        let dir = TempDir::new().unwrap();
        let (mut controller, mut rx) = controller();

        let first = controller.start_execution("echo one", dir.path(), Some("one"), None);
        let second = controller.start_execution("echo two", dir.path(), Some("two"), None);
        settle(&mut controller, &[&first, &second]).await;
        drain(&mut rx);

        controller.handle_intent(DisplayIntent::RemoveCurrent);
        assert!(!controller.history().has_entry(&second));
        assert!(controller.history().has_entry(&first));
        assert_eq!(controller.focused(), &FocusedSession::default());

        let messages = drain(&mut rx);
        assert!(messages.contains(&DisplayMessage::Clear));
        let mut state = DisplayState::default();
        messages.iter().for_each(|m| state.apply(m));
        assert_eq!(state, DisplayState::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clear_history_keeps_running_and_detaches() {
        let dir = TempDir::new().unwrap();
        let (mut controller, _rx) = controller();

        let long = controller.start_execution("sleep 30", dir.path(), Some("long"), None);
        let quick = controller.start_execution("true", dir.path(), Some("quick"), None);
        settle(&mut controller, &[&quick]).await;

        let mut changes = controller.subscribe();
        let _ = changes.borrow_and_update();
        controller.clear_history();
        assert!(changes.has_changed().unwrap());

        assert!(controller.history().has_entry(&long));
        assert!(!controller.history().has_entry(&quick));
        assert_eq!(controller.focused().id, None);

        controller.inspect(&long);
        controller.handle_intent(DisplayIntent::Cancel);
        assert!(!controller.is_running(&long));
    }
}
