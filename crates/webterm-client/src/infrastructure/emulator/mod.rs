//! Local-TTY adapter for the terminal-emulator port.
//!
//! [`TtyEmulator`] attaches the session to the terminal the client is
//! running in: inbound bytes are written verbatim to stdout for the local
//! terminal to interpret, and raw keystrokes are read from stdin and handed
//! to the bridge as the input stream.  Escape-sequence interpretation,
//! cursor movement, and the rest of terminal rendering are the local
//! terminal's business — nothing is transformed on the way through.
//!
//! Opening the emulator puts the TTY into raw mode so keystrokes reach the
//! remote host unprocessed (including control characters like `^C`, which
//! belong to the remote session while streaming).  Full-screen mode maps to
//! the alternate screen, which keeps the user's scrollback intact until the
//! session ends.  `destroy` undoes both, returning the terminal to the
//! state the user started in.

pub mod mock;

use std::io::{self, Write};

use bytes::Bytes;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::bridge::{EmulatorError, TerminalEmulator};

/// Size of each stdin read.
const INPUT_BUF_SIZE: usize = 1024;

/// Capacity of the input stream handed to the bridge.
const INPUT_CAPACITY: usize = 128;

/// A terminal emulator backed by the process's own TTY.
pub struct TtyEmulator {
    input: Option<mpsc::Receiver<Bytes>>,
    input_tx: mpsc::Sender<Bytes>,
    open: bool,
    fullscreen: bool,
}

impl TtyEmulator {
    /// Creates an emulator that is not yet attached to the TTY.
    ///
    /// The TTY is left untouched until [`TerminalEmulator::open`] runs, so
    /// constructing an emulator for a session that never opens has no
    /// visible effect.
    pub fn new() -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);
        Self {
            input: Some(input_rx),
            input_tx,
            open: false,
            fullscreen: false,
        }
    }
}

impl Default for TtyEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalEmulator for TtyEmulator {
    /// Puts the TTY into raw mode (and the alternate screen when
    /// `fullscreen`), then starts the stdin pump that feeds the input
    /// stream.
    ///
    /// Must be called from within a tokio runtime.
    fn open(&mut self, fullscreen: bool) -> Result<(), EmulatorError> {
        enable_raw_mode()?;
        if fullscreen {
            execute!(io::stdout(), EnterAlternateScreen)?;
        }
        self.open = true;
        self.fullscreen = fullscreen;

        // Stdin pump: raw keystroke bytes → input stream, until stdin ends
        // or the bridge drops the receiver.
        let tx = self.input_tx.clone();
        tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let mut buf = [0u8; INPUT_BUF_SIZE];
            loop {
                match stdin.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "stdin read failed");
                        break;
                    }
                }
            }
            debug!("stdin pump ended");
        });

        Ok(())
    }

    fn take_input(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.input.take()
    }

    /// Writes one chunk of remote output to stdout, flushed immediately so
    /// interactive prompts appear without delay.
    fn write(&mut self, data: &[u8]) -> Result<(), EmulatorError> {
        if !self.open {
            return Err(EmulatorError::NotOpen);
        }
        let mut stdout = io::stdout();
        stdout.write_all(data)?;
        stdout.flush()?;
        Ok(())
    }

    fn toggle_fullscreen(&mut self, enabled: bool) {
        if enabled == self.fullscreen {
            return;
        }
        let result = if enabled {
            execute!(io::stdout(), EnterAlternateScreen)
        } else {
            execute!(io::stdout(), LeaveAlternateScreen)
        };
        match result {
            Ok(()) => self.fullscreen = enabled,
            Err(err) => warn!(%err, "failed to toggle fullscreen"),
        }
    }

    /// Returns the TTY to its original state.  Safe to call on an emulator
    /// that never opened, and idempotent.
    fn destroy(&mut self) {
        if !self.open {
            return;
        }
        if self.fullscreen {
            if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
                warn!(%err, "failed to leave alternate screen");
            }
            self.fullscreen = false;
        }
        if let Err(err) = disable_raw_mode() {
            warn!(%err, "failed to disable raw mode");
        }
        self.open = false;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// Raw mode and the alternate screen need a real TTY, which test runners do
// not have; those paths are exercised through the mock.  The tests here
// cover the parts that never touch the terminal.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_can_only_be_taken_once() {
        let mut emulator = TtyEmulator::new();
        assert!(emulator.take_input().is_some());
        assert!(emulator.take_input().is_none());
    }

    #[test]
    fn test_write_before_open_is_rejected() {
        let mut emulator = TtyEmulator::new();
        let result = emulator.write(b"data");
        assert!(matches!(result, Err(EmulatorError::NotOpen)));
    }

    #[test]
    fn test_destroy_before_open_is_a_no_op() {
        // A session that fails before opening still destroys the emulator;
        // that must not disturb a TTY we never touched.
        let mut emulator = TtyEmulator::new();
        emulator.destroy();
        emulator.destroy();
    }
}
