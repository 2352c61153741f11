//! # scriptrs Terminal Surface (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! A passive rendering surface for the display bridge that writes to a terminal
//! (or any `std::io::Write`). It has no opinion about executions: it prints what
//! it is told to print and keeps track of which controls are currently enabled,
//! so a front-end can decide whether to accept input or a cancel request.
//!
//! ## Rendering Rules
//!
//! - `Append` text is written verbatim (ANSI sequences included) and flushed at once.
//! - `Clear` does not wipe the terminal; it only makes sure the next output starts on
//!   a fresh line, so consecutive sessions stay readable in the scrollback.
//! - `Reveal` is meaningless for a terminal and is ignored.
//! - Control messages only update the tracked [`DisplayState`].
//!
use crate::runner::display::{DisplayMessage, DisplayState};
use std::io::{self, Write};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Renders display messages onto a byte sink.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    out: W,
    state: DisplayState,
    /// Whether the last byte written was not a newline.
    mid_line: bool,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: DisplayState::default(),
            mid_line: false,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Applies one message.
    pub fn render(&mut self, message: &DisplayMessage) {
        self.state.apply(message);
        let result = match message {
            DisplayMessage::Append(text) => self.write(text),
            DisplayMessage::Clear if self.mid_line => self.write("\n"),
            DisplayMessage::Reveal => {
                trace!("Reveal requested");
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            // Usually a closed pipe (`scriptrs run x | head`); keep going silently.
            warn!("Failed to write to terminal: {}", e);
        }
    }

    /// Renders every message already waiting on `rx` without blocking.
    pub fn pump(&mut self, rx: &mut mpsc::UnboundedReceiver<DisplayMessage>) {
        while let Ok(message) = rx.try_recv() {
            self.render(&message);
        }
    }

    /// Consumes the surface and returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        self.mid_line = !text.ends_with('\n');
        Ok(())
    }
}
