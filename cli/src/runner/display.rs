//! # scriptrs Display Bridge (`runner::display`)
//!
//! File: cli/src/runner/display.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The message contract between the execution controller and a passive
//! rendering surface. The bridge has no logic of its own: the controller
//! sends [`DisplayMessage`]s out, the surface sends [`DisplayIntent`]s back.
//!
//! ## Architecture
//!
//! - Outbound messages travel on an unbounded `tokio::sync::mpsc` channel, so
//!   relaying never blocks the controller. If no surface is attached (the
//!   receiver was dropped), messages are discarded silently.
//! - [`DisplayState`] is the small amount of state a surface keeps: which
//!   controls are currently enabled. Surfaces fold every message into it.
//!
use tokio::sync::mpsc;
use tracing::trace;

/// Controller → surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMessage {
    /// Bring the surface into view.
    Reveal,
    /// Raw text to add to the visible buffer, verbatim.
    Append(String),
    /// Empty the visible buffer.
    Clear,
    EnableInput,
    DisableInput,
    EnableCancel,
    DisableCancel,
    EnableRemovable,
    DisableRemovable,
}

/// Surface → controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayIntent {
    /// A line typed by the user for the focused process.
    Input(String),
    /// Stop the focused process.
    Cancel,
    /// Drop the focused record from history and detach.
    RemoveCurrent,
}

/// Sending half of the bridge, owned by the controller.
#[derive(Debug, Clone)]
pub struct DisplayBridge {
    tx: mpsc::UnboundedSender<DisplayMessage>,
}

impl DisplayBridge {
    /// Creates a bridge and the receiver a surface should consume.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn reveal(&self) {
        self.send(DisplayMessage::Reveal);
    }

    pub fn append(&self, text: &str) {
        if !text.is_empty() {
            self.send(DisplayMessage::Append(text.to_string()));
        }
    }

    pub fn clear(&self) {
        self.send(DisplayMessage::Clear);
    }

    /// Switches the controls for a live session (`true`: input and cancel on,
    /// remove off) or a finished one (the reverse).
    pub fn set_live_controls(&self, live: bool) {
        if live {
            self.send(DisplayMessage::EnableInput);
            self.send(DisplayMessage::EnableCancel);
            self.send(DisplayMessage::DisableRemovable);
        } else {
            self.send(DisplayMessage::DisableInput);
            self.send(DisplayMessage::DisableCancel);
            self.send(DisplayMessage::EnableRemovable);
        }
    }

    /// Turns every control off; used when nothing is focused.
    pub fn disable_all_controls(&self) {
        self.send(DisplayMessage::DisableInput);
        self.send(DisplayMessage::DisableCancel);
        self.send(DisplayMessage::DisableRemovable);
    }

    fn send(&self, message: DisplayMessage) {
        if self.tx.send(message).is_err() {
            trace!("No display surface attached; message dropped");
        }
    }
}

/// Control state tracked by a rendering surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    pub input_enabled: bool,
    pub cancel_enabled: bool,
    pub removable_enabled: bool,
}

impl DisplayState {
    /// Folds a control message into the state. Content messages are ignored.
    pub fn apply(&mut self, message: &DisplayMessage) {
        match message {
            DisplayMessage::EnableInput => self.input_enabled = true,
            DisplayMessage::DisableInput => self.input_enabled = false,
            DisplayMessage::EnableCancel => self.cancel_enabled = true,
            DisplayMessage::DisableCancel => self.cancel_enabled = false,
            DisplayMessage::EnableRemovable => self.removable_enabled = true,
            DisplayMessage::DisableRemovable => self.removable_enabled = false,
            DisplayMessage::Reveal | DisplayMessage::Append(_) | DisplayMessage::Clear => {}
        }
    }
}
