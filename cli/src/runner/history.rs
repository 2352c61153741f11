//! # scriptrs History Store (`runner::history`)
//!
//! File: cli/src/runner/history.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The authoritative in-memory record of every execution: what ran, where, when,
//! whether it is still running, and everything it printed. Nothing here is
//! persisted; the store lives as long as the controller that owns it.
//!
//! ## Architecture
//!
//! - Records are keyed by execution id and also kept in insertion order, which
//!   `mark_terminal` scans and `list` uses for the running group.
//! - Every id ever issued is remembered, so an id is never handed out twice even
//!   after its record was evicted.
//! - Changes are announced on a `tokio::sync::watch` channel carrying a revision
//!   counter. Subscribers treat it as a payload-free "something changed" signal and
//!   re-query [`HistoryStore::list`]. Several mutations between two wakeups
//!   coalesce into one.
//!
//! ## Invariants
//!
//! - `status == Running` until exactly one terminal transition; terminal states
//!   are absorbing.
//! - `end_time` is set if and only if the status is not `Running`.
//! - `output` is append-only until the record is removed.
//!
use crate::core::i18n::{tr, Locale, Message};
use chrono::{DateTime, Local};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info};

/// Lifecycle state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_running(self) -> bool {
        self == ExecutionStatus::Running
    }

    /// Translated label for listings.
    pub fn label(self, locale: Locale) -> &'static str {
        match self {
            ExecutionStatus::Running => tr(locale, Message::Running),
            ExecutionStatus::Completed => tr(locale, Message::Completed),
            ExecutionStatus::Failed => tr(locale, Message::Failed),
        }
    }
}

/// Stored state for one launched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub id: String,
    pub script_name: String,
    pub command: String,
    pub working_directory: PathBuf,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
    pub output: String,
    /// Creation order; breaks `start_time` ties in listings.
    seq: u64,
}

/// In-memory registry of execution records with change notification.
#[derive(Debug)]
pub struct HistoryStore {
    records: HashMap<String, ExecutionRecord>,
    order: Vec<String>,
    issued: HashSet<String>,
    next_seq: u64,
    last_stamp: i64,
    changes: watch::Sender<u64>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            issued: HashSet::new(),
            next_seq: 0,
            last_stamp: 0,
            changes,
        }
    }

    /// Subscribes to the change signal. The carried value is a revision counter
    /// and has no meaning beyond "changed since you last looked".
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Creates a `Running` record and returns its id.
    ///
    /// Without an `id`, one is generated as `<script_name>-<millis>` from a
    /// strictly increasing clock. A supplied or generated id that was already
    /// issued gets a random suffix instead of being reused.
    pub fn add_running(
        &mut self,
        script_name: &str,
        command: &str,
        working_directory: &Path,
        id: Option<&str>,
    ) -> String {
        let candidate = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("{}-{}", script_name, self.next_stamp()),
        };
        let id = self.unique_id(candidate);

        let record = ExecutionRecord {
            id: id.clone(),
            script_name: script_name.to_string(),
            command: command.to_string(),
            working_directory: working_directory.to_path_buf(),
            status: ExecutionStatus::Running,
            start_time: Local::now(),
            end_time: None,
            output: String::new(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.issued.insert(id.clone());
        self.order.push(id.clone());
        self.records.insert(id.clone(), record);
        info!(id = %id, script = script_name, "Execution record created");
        self.notify();
        id
    }

    /// Appends `text` to the record's output. Unknown ids are ignored.
    pub fn append_output(&mut self, id: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(record) = self.records.get_mut(id) {
            record.output.push_str(text);
            self.notify();
        }
    }

    /// Accumulated output, or `""` for unknown ids.
    pub fn get_output(&self, id: &str) -> &str {
        self.records
            .get(id)
            .map(|record| record.output.as_str())
            .unwrap_or_default()
    }

    pub fn get_entry(&self, id: &str) -> Option<&ExecutionRecord> {
        self.records.get(id)
    }

    pub fn has_entry(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Terminates the first `Running` record named `script_name`, in insertion
    /// order. With several running records of the same name only the oldest is
    /// affected. Returns the id that was transitioned, if any.
    pub fn mark_terminal(&mut self, script_name: &str, success: bool) -> Option<String> {
        let id = self
            .order
            .iter()
            .find(|id| {
                self.records
                    .get(*id)
                    .is_some_and(|r| r.script_name == script_name && r.status.is_running())
            })?
            .clone();
        self.mark_terminal_by_id(&id, success);
        Some(id)
    }

    /// Terminates the record `id` if it is still `Running`. Returns whether a
    /// transition happened; terminal records are left untouched.
    pub fn mark_terminal_by_id(&mut self, id: &str, success: bool) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if !record.status.is_running() {
            debug!(id, status = ?record.status, "Ignoring repeated terminal transition");
            return false;
        }
        record.status = if success {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        record.end_time = Some(Local::now());
        info!(id, status = ?record.status, "Execution finished");
        self.notify();
        true
    }

    /// Deletes the record unconditionally. Unknown ids are ignored.
    pub fn remove_entry(&mut self, id: &str) {
        if self.records.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
            info!(id, "Execution record removed");
            self.notify();
        }
    }

    /// Removes every finished record; running ones survive.
    pub fn clear(&mut self) {
        let records = &mut self.records;
        records.retain(|_, record| record.status.is_running());
        self.order.retain(|id| records.contains_key(id));
        info!(remaining = self.records.len(), "History cleared");
        self.notify();
    }

    /// Snapshot of all records: running ones first in insertion order, then
    /// finished ones newest first.
    pub fn list(&self) -> Vec<ExecutionRecord> {
        let mut running = Vec::new();
        let mut finished = Vec::new();
        for id in &self.order {
            if let Some(record) = self.records.get(id) {
                if record.status.is_running() {
                    running.push(record.clone());
                } else {
                    finished.push(record.clone());
                }
            }
        }
        finished.sort_by(|a, b| {
            b.start_time
                .cmp(&a.start_time)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        running.extend(finished);
        running
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.status.is_running())
            .count()
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    fn next_stamp(&mut self) -> i64 {
        let now = Local::now().timestamp_millis();
        self.last_stamp = now.max(self.last_stamp + 1);
        self.last_stamp
    }

    fn unique_id(&self, candidate: String) -> String {
        if !self.issued.contains(&candidate) {
            return candidate;
        }
        let mut rng = rand::thread_rng();
        loop {
            let suffixed = format!("{}-{:06x}", candidate, rng.gen_range(0..0x100_0000u32));
            if !self.issued.contains(&suffixed) {
                debug!(id = %suffixed, "Execution id collided, using random suffix");
                return suffixed;
            }
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn cwd() -> PathBuf {
        PathBuf::from("/tmp")
    }

    #[test]
    fn test_add_running_creates_running_record() {
        let mut store = HistoryStore::new();
        let id = store.add_running("build", "npm run build", &cwd(), None);

        assert!(id.starts_with("build-"));
        let record = store.get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Running);
        assert_eq!(record.command, "npm run build");
        assert_eq!(record.working_directory, cwd());
        assert!(record.end_time.is_none());
        assert!(record.output.is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut store = HistoryStore::new();
        let ids: HashSet<String> = (0..50)
            .map(|_| store.add_running("dev", "npm run dev", &cwd(), None))
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_supplied_id_is_used_and_never_reused() {
        let mut store = HistoryStore::new();
        let first = store.add_running("a", "echo a", &cwd(), Some("a1"));
        assert_eq!(first, "a1");

        store.remove_entry("a1");
        let second = store.add_running("a", "echo a", &cwd(), Some("a1"));
        assert_ne!(second, "a1");
        assert!(second.starts_with("a1-"));
    }

    #[test]
    fn test_append_output_is_ordered_and_additive() {
        let mut store = HistoryStore::new();
        let id = store.add_running("x", "echo", &cwd(), None);
        store.append_output(&id, "a");
        store.append_output(&id, "b");
        store.append_output(&id, "c");
        assert_eq!(store.get_output(&id), "abc");
    }

    #[test]
    fn test_unknown_ids_are_harmless() {
        let mut store = HistoryStore::new();
        store.append_output("ghost", "text");
        store.remove_entry("ghost");
        assert_eq!(store.get_output("ghost"), "");
        assert!(store.get_entry("ghost").is_none());
        assert!(!store.has_entry("ghost"));
        assert!(!store.mark_terminal_by_id("ghost", true));
        assert!(store.mark_terminal("ghost", true).is_none());
    }

    #[test]
    fn test_mark_terminal_sets_status_and_end_time() {
        let mut store = HistoryStore::new();
        let ok = store.add_running("ok", "true", &cwd(), None);
        let bad = store.add_running("bad", "false", &cwd(), None);

        assert_eq!(store.mark_terminal("ok", true), Some(ok.clone()));
        assert_eq!(store.mark_terminal("bad", false), Some(bad.clone()));

        let ok_record = store.get_entry(&ok).unwrap();
        assert_eq!(ok_record.status, ExecutionStatus::Completed);
        assert!(ok_record.end_time.is_some());
        assert_eq!(store.get_entry(&bad).unwrap().status, ExecutionStatus::Failed);
    }

    #[test]
    fn test_mark_terminal_affects_first_running_match_only() {
        let mut store = HistoryStore::new();
        let first = store.add_running("dev", "npm run dev", &cwd(), Some("dev-a"));
        let second = store.add_running("dev", "npm run dev", &cwd(), Some("dev-b"));

        assert_eq!(store.mark_terminal("dev", true), Some(first.clone()));
        assert_eq!(store.get_entry(&second).unwrap().status, ExecutionStatus::Running);

        // The next call skips the finished record.
        assert_eq!(store.mark_terminal("dev", false), Some(second.clone()));
        assert_eq!(store.get_entry(&second).unwrap().status, ExecutionStatus::Failed);
        assert!(store.mark_terminal("dev", true).is_none());
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let mut store = HistoryStore::new();
        let id = store.add_running("t", "false", &cwd(), None);
        assert!(store.mark_terminal_by_id(&id, false));
        let ended = store.get_entry(&id).unwrap().end_time;

        assert!(!store.mark_terminal_by_id(&id, true));
        let record = store.get_entry(&id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert_eq!(record.end_time, ended);
    }

    #[test]
    fn test_clear_keeps_running_records() {
        // a1 finishes, b1 keeps running; clearing leaves only b1.
        let mut store = HistoryStore::new();
        store.add_running("a", "echo a", &cwd(), Some("a1"));
        store.add_running("b", "echo b", &cwd(), Some("b1"));
        store.mark_terminal("a", true);
        store.clear();

        assert_eq!(store.len(), 1);
        assert!(store.has_entry("b1"));
        assert!(!store.has_entry("a1"));
        let ids: Vec<String> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b1".to_string()]);
    }

    #[test]
    fn test_list_orders_running_first_then_newest() {
        let mut store = HistoryStore::new();
        store.add_running("old", "echo", &cwd(), Some("old"));
        store.add_running("live", "sleep", &cwd(), Some("live"));
        store.add_running("new", "echo", &cwd(), Some("new"));
        store.mark_terminal_by_id("old", true);
        store.mark_terminal_by_id("new", false);

        let ids: Vec<String> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["live", "new", "old"]);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut store = HistoryStore::new();
        let id = store.add_running("s", "echo", &cwd(), None);
        let snapshot = store.list();
        store.append_output(&id, "later");
        assert_eq!(snapshot[0].output, "");
        assert_eq!(store.list()[0].output, "later");
    }

    #[test]
    fn test_mutations_fire_change_signal() {
        let mut store = HistoryStore::new();
        let mut changes = store.subscribe();
        assert!(!changes.has_changed().unwrap());

        let id = store.add_running("n", "echo", &cwd(), None);
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        store.mark_terminal_by_id(&id, true);
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        store.clear();
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        // No-ops stay quiet.
        store.remove_entry("ghost");
        store.append_output("ghost", "x");
        assert!(!changes.has_changed().unwrap());
    }

    #[test]
    fn test_running_count() {
        let mut store = HistoryStore::new();
        store.add_running("a", "x", &cwd(), Some("a"));
        store.add_running("b", "y", &cwd(), Some("b"));
        store.mark_terminal_by_id("a", true);
        assert_eq!(store.running_count(), 1);
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }
}
