//! # scriptrs Process Registry (`runner::registry`)
//!
//! File: cli/src/runner/registry.rs
//! Author: Christi Mahu
//!
//! Maps execution ids to the handles of processes that are still in flight.
//! An id is present only between a successful spawn and the controller's
//! terminal transition for it (exit or cancellation); unregistering drops the
//! handle, which closes the child's stdin and releases the kill trigger.
//!
use crate::common::process::{self, SpawnedProcess};
use crate::core::error::{Result, ScriptrsError};
use anyhow::anyhow;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Live handle to a running child.
#[derive(Debug)]
pub struct ProcessHandle {
    script_name: String,
    pid: Option<u32>,
    input: Option<mpsc::UnboundedSender<String>>,
    kill: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
    pub fn new(script_name: &str, spawned: SpawnedProcess) -> Self {
        Self {
            script_name: script_name.to_string(),
            pid: spawned.pid,
            input: spawned.input,
            kill: Some(spawned.kill),
        }
    }

    /// A handle with no process behind it; every signal and write fails.
    #[cfg(test)]
    pub fn detached(script_name: &str) -> Self {
        Self {
            script_name: script_name.to_string(),
            pid: None,
            input: None,
            kill: None,
        }
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Queues `text` for the child's stdin. Returns `false` when the child has
    /// no writable input stream any more.
    pub fn write_input(&self, text: &str) -> bool {
        match &self.input {
            Some(input) => input.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    /// Interrupt-style termination (SIGINT to the process group on Unix).
    pub fn interrupt(&self) -> Result<()> {
        let pid = self.pid.ok_or_else(|| no_pid_error("interrupt"))?;
        process::interrupt(pid)
    }

    /// Stronger termination: SIGTERM on Unix, then a forced kill through the
    /// waiter task if the signal could not be delivered.
    pub fn terminate(&mut self) -> Result<()> {
        let signalled = match self.pid {
            Some(pid) => process::terminate(pid),
            None => Err(no_pid_error("terminate")),
        };
        match signalled {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(script = %self.script_name, "Terminate signal failed, requesting kill: {}", e);
                match self.kill.take().map(|kill| kill.send(())) {
                    Some(Ok(())) => Ok(()),
                    _ => Err(e),
                }
            }
        }
    }
}

fn no_pid_error(action: &str) -> anyhow::Error {
    anyhow!(ScriptrsError::Signal {
        pid: 0,
        reason: format!("cannot {} a process without a known pid", action),
    })
}

/// Execution id → live process handle, for in-flight executions only.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    handles: HashMap<String, ProcessHandle>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: &str, handle: ProcessHandle) {
        debug!(id, pid = ?handle.pid(), "Process registered");
        if self.handles.insert(id.to_string(), handle).is_some() {
            debug!(id, "Replaced an existing process handle");
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProcessHandle> {
        self.handles.get(id)
    }

    /// Removes and returns the handle for `id`, if one is registered.
    pub fn unregister(&mut self, id: &str) -> Option<ProcessHandle> {
        let handle = self.handles.remove(id);
        if handle.is_some() {
            debug!(id, "Process unregistered");
        }
        handle
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
