//! # scriptrs Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module launches shell-interpreted commands as child processes and turns
//! everything they do into [`ProcessEvent`] messages on a single channel. The
//! execution controller owns the receiving end, so all state changes caused by a
//! child happen one event at a time on the controller's task, never from the
//! I/O tasks spawned here.
//!
//! ## Architecture
//!
//! For every spawned child three kinds of background tasks are started:
//! - **Stream forwarders** (one for stdout, one for stderr): read raw bytes, decode
//!   them to text without splitting multi-byte characters, and emit
//!   `ProcessEvent::Output` chunks.
//! - **Input writer**: drains an unbounded channel of text into the child's stdin.
//!   Dropping the sender closes the child's stdin.
//! - **Waiter**: waits for the child to exit (or force-kills it on request), waits
//!   for both forwarders to drain, then emits exactly one `ProcessEvent::Exited`.
//!
//! On Unix the child is placed in its own process group so that signals reach the
//! whole tree started by the shell, and so that a Ctrl-C typed at the terminal is
//! handled by scriptrs (as a cancellation) rather than delivered to the child directly.
//!
//! ## Usage
//!
//! ```rust
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let spec = ShellCommand::new("sh", "-c", "echo hi", Path::new("."));
//! let spawned = process::spawn_shell("greet-1", &spec, tx)?;
//! while let Some(event) = rx.recv().await {
//!     // Output { .. } chunks, then one Exited { .. }
//! }
//! ```
//!
use crate::core::error::{Result, ScriptrsError};
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, trace, warn};

/// Size of the read buffer used by the stream forwarders.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Which pipe a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Everything a running child reports back to its owner.
///
/// Events for one id arrive in the order they happened on each pipe, and
/// `Exited` is always the last event for that id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Output {
        id: String,
        stream: OutputStream,
        text: String,
    },
    /// The child terminated. `code` is `None` when the OS reports no exit code
    /// (killed by a signal, or the wait itself failed).
    Exited { id: String, code: Option<i32> },
}

impl ProcessEvent {
    /// Execution id the event belongs to.
    pub fn id(&self) -> &str {
        match self {
            ProcessEvent::Output { id, .. } | ProcessEvent::Exited { id, .. } => id,
        }
    }
}

/// A command string plus the interpreter and directory it runs with.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub shell: String,
    pub shell_arg: String,
    pub command: String,
    pub working_dir: PathBuf,
}

impl ShellCommand {
    pub fn new(shell: &str, shell_arg: &str, command: &str, working_dir: &Path) -> Self {
        Self {
            shell: shell.to_string(),
            shell_arg: shell_arg.to_string(),
            command: command.to_string(),
            working_dir: working_dir.to_path_buf(),
        }
    }
}

/// The parts of a freshly spawned child that its owner keeps.
#[derive(Debug)]
pub struct SpawnedProcess {
    /// OS process id (also the process group id on Unix).
    pub pid: Option<u32>,
    /// Text sent here is written verbatim to the child's stdin.
    pub input: Option<mpsc::UnboundedSender<String>>,
    /// Sending on this asks the waiter task to force-kill the child.
    pub kill: oneshot::Sender<()>,
}

/// Spawns `spec` through its shell and starts the background I/O tasks.
///
/// Returns once the OS has created the process; completion is only observable
/// through the `Exited` event sent on `events`.
///
/// # Errors
///
/// * `ScriptrsError::Spawn` - the interpreter could not be started (missing shell,
///   missing or inaccessible working directory, resource limits).
#[instrument(skip(spec, events), fields(command = %spec.command))]
pub fn spawn_shell(
    id: &str,
    spec: &ShellCommand,
    events: mpsc::UnboundedSender<ProcessEvent>,
) -> Result<SpawnedProcess> {
    let mut cmd = Command::new(&spec.shell);
    cmd.arg(&spec.shell_arg)
        .arg(&spec.command)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group: signals reach the shell and everything it started.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|e| {
        anyhow!(ScriptrsError::Spawn(format!(
            "{} {} '{}' in {}: {}",
            spec.shell,
            spec.shell_arg,
            spec.command,
            spec.working_dir.display(),
            e
        )))
    })?;

    let pid = child.id();
    debug!(id, ?pid, "Spawned child process");

    let input = child.stdin.take().map(|stdin| spawn_input_writer(id, stdin));

    let stdout_task = child.stdout.take().map(|out| {
        tokio::spawn(forward_stream(
            id.to_string(),
            OutputStream::Stdout,
            out,
            events.clone(),
        ))
    });
    let stderr_task = child.stderr.take().map(|err| {
        tokio::spawn(forward_stream(
            id.to_string(),
            OutputStream::Stderr,
            err,
            events.clone(),
        ))
    });

    let (kill_tx, kill_rx) = oneshot::channel();
    let waiter_id = id.to_string();
    tokio::spawn(async move {
        let code = wait_for_exit(&waiter_id, &mut child, kill_rx).await;
        // Drain the pipes before announcing the exit so no output trails it.
        for task in [stdout_task, stderr_task].into_iter().flatten() {
            if let Err(e) = task.await {
                warn!(id = %waiter_id, "Output forwarder task failed: {}", e);
            }
        }
        debug!(id = %waiter_id, ?code, "Child process closed");
        let _ = events.send(ProcessEvent::Exited {
            id: waiter_id,
            code,
        });
    });

    Ok(SpawnedProcess {
        pid,
        input,
        kill: kill_tx,
    })
}

/// Waits for `child` to exit, force-killing it if a kill request arrives first.
async fn wait_for_exit(id: &str, child: &mut Child, kill_rx: oneshot::Receiver<()>) -> Option<i32> {
    let status = tokio::select! {
        status = child.wait() => status,
        request = kill_rx => {
            // A dropped sender just means nobody will ask for a kill any more.
            if request.is_ok() {
                force_kill(id, child);
            }
            child.wait().await
        }
    };
    match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(id, "Failed to wait for child process: {}", e);
            None
        }
    }
}

/// Kills the child and, on Unix, every process in its group, so grandchildren
/// holding the output pipes do not keep the forwarders alive.
fn force_kill(id: &str, child: &mut Child) {
    debug!(id, "Force-killing child process");
    if kill_group(child) {
        return;
    }
    if let Err(e) = child.start_kill() {
        debug!(id, "Kill request failed (process likely exited): {}", e);
    }
}

#[cfg(unix)]
fn kill_group(child: &Child) -> bool {
    child
        .id()
        .is_some_and(|pid| signal_group(pid, nix::sys::signal::Signal::SIGKILL).is_ok())
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) -> bool {
    false
}

/// Starts the task that feeds text into a child's stdin.
fn spawn_input_writer(id: &str, mut stdin: ChildStdin) -> mpsc::UnboundedSender<String> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let id = id.to_string();
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                // Typically a broken pipe after the child stopped reading.
                debug!(%id, "Stopped forwarding input: {}", e);
                break;
            }
            if let Err(e) = stdin.flush().await {
                debug!(%id, "Failed to flush child stdin: {}", e);
            }
        }
        trace!(%id, "Input writer finished");
    });
    tx
}

/// Reads one pipe to EOF and emits its content as `Output` events.
async fn forward_stream<R>(
    id: String,
    stream: OutputStream,
    mut reader: R,
    events: mpsc::UnboundedSender<ProcessEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    let mut decoder = Utf8Decoder::default();
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                if !text.is_empty() {
                    let _ = events.send(ProcessEvent::Output {
                        id: id.clone(),
                        stream,
                        text,
                    });
                }
            }
            Err(e) => {
                warn!(%id, ?stream, "Error reading child output: {}", e);
                break;
            }
        }
    }
    let rest = decoder.finish();
    if !rest.is_empty() {
        let _ = events.send(ProcessEvent::Output {
            id,
            stream,
            text: rest,
        });
    }
}

/// Incremental UTF-8 decoding that never splits a character across chunks.
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// chunk arrives. Genuinely invalid bytes are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        // Incomplete tail: keep it for the next chunk.
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
        out
    }

    /// Flushes whatever is still held back.
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// Sends SIGINT to the process group led by `pid`.
#[cfg(unix)]
pub fn interrupt(pid: u32) -> Result<()> {
    signal_group(pid, nix::sys::signal::Signal::SIGINT)
}

/// Sends SIGTERM to the process group led by `pid`.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<()> {
    signal_group(pid, nix::sys::signal::Signal::SIGTERM)
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> Result<()> {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| {
        anyhow!(ScriptrsError::Signal {
            pid,
            reason: "pid out of range".to_string(),
        })
    })?;
    debug!(pid, ?signal, "Signalling process group");
    killpg(Pid::from_raw(raw), signal).map_err(|e| {
        anyhow!(ScriptrsError::Signal {
            pid,
            reason: e.to_string(),
        })
    })
}

/// Interrupt-style signals do not exist here; callers fall back to a kill.
#[cfg(not(unix))]
pub fn interrupt(pid: u32) -> Result<()> {
    Err(anyhow!(ScriptrsError::Signal {
        pid,
        reason: "interrupt signals are not supported on this platform".to_string(),
    }))
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Result<()> {
    Err(anyhow!(ScriptrsError::Signal {
        pid,
        reason: "terminate signals are not supported on this platform".to_string(),
    }))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Collects events for one child until its `Exited` arrives.
    async fn collect(rx: &mut mpsc::UnboundedReceiver<ProcessEvent>) -> (String, Option<i32>) {
        let mut output = String::new();
        loop {
            let event = timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("timed out waiting for process events")
                .expect("event channel closed");
            match event {
                ProcessEvent::Output { text, .. } => output.push_str(&text),
                ProcessEvent::Exited { code, .. } => return (output, code),
            }
        }
    }

    fn sh(command: &str, dir: &Path) -> ShellCommand {
        ShellCommand::new("sh", "-c", command, dir)
    }

    #[test]
    fn test_decoder_holds_back_split_character() {
        let mut decoder = Utf8Decoder::default();
        let bytes = "héllo".as_bytes();
        // 'é' is two bytes; split between them.
        assert_eq!(decoder.decode(&bytes[..2]), "h");
        assert_eq!(decoder.decode(&bytes[2..]), "éllo");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(&[b'a', 0xff, b'b']), "a\u{fffd}b");
        // A dangling lead byte at EOF is flushed lossily.
        assert_eq!(decoder.decode(&[0xe2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[test]
    fn test_decoder_keeps_split_character_after_invalid_byte() {
        let mut decoder = Utf8Decoder::default();
        // 0xff is invalid; 0xe2 starts a '€' that completes in the next chunk.
        assert_eq!(decoder.decode(&[0xff, 0xe2]), "\u{fffd}");
        assert_eq!(decoder.decode(&[0x82, 0xac]), "€");
        assert_eq!(decoder.decode(&[b'x', 0xc3, 0x28, 0xe2, 0x82]), "x\u{fffd}(");
        assert_eq!(decoder.decode(&[0xac]), "€");
        assert_eq!(decoder.finish(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_shell_streams_output_then_exit() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let spawned = spawn_shell("t-1", &sh("echo out; echo err 1>&2", dir.path()), tx).unwrap();
        assert!(spawned.pid.is_some());

        let (output, code) = collect(&mut rx).await;
        assert_eq!(code, Some(0));
        assert!(output.contains("out\n"));
        assert!(output.contains("err\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_shell_reports_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _spawned = spawn_shell("t-2", &sh("exit 3", dir.path()), tx).unwrap();
        let (_, code) = collect(&mut rx).await;
        assert_eq!(code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_shell_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _spawned = spawn_shell("t-3", &sh("ls", dir.path()), tx).unwrap();
        let (output, _) = collect(&mut rx).await;
        assert!(output.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_spawn_shell_missing_working_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = spawn_shell("t-4", &sh("echo hi", &missing), tx).unwrap_err();
        assert!(err.to_string().starts_with("Failed to start process"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_input_is_forwarded_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let spawned =
            spawn_shell("t-5", &sh("read line; echo \"got $line\"", dir.path()), tx).unwrap();
        spawned
            .input
            .as_ref()
            .unwrap()
            .send("abc\n".to_string())
            .unwrap();
        let (output, code) = collect(&mut rx).await;
        assert_eq!(code, Some(0));
        assert!(output.contains("got abc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interrupt_stops_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let spawned = spawn_shell("t-6", &sh("sleep 30", dir.path()), tx).unwrap();
        // Give the shell a moment to set up before signalling.
        tokio::time::sleep(Duration::from_millis(100)).await;
        interrupt(spawned.pid.unwrap()).unwrap();
        let (_, code) = collect(&mut rx).await;
        assert_ne!(code, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_request_force_kills() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let spawned = spawn_shell("t-7", &sh("sleep 30", dir.path()), tx).unwrap();
        spawned.kill.send(()).unwrap();
        let (_, code) = collect(&mut rx).await;
        assert_eq!(code, None);
    }
}
