//! Recording mock for the terminal-emulator port.
//!
//! # Why a mock emulator?
//!
//! The real [`TtyEmulator`](super::TtyEmulator) switches the process's TTY
//! into raw mode and writes to the actual stdout — neither of which can be
//! observed (or tolerated) from test code.  The `MockEmulator` replaces all
//! terminal I/O with in-memory recording behind a [`MockEmulatorProbe`], so
//! a test can hand the emulator to a bridge and still inspect exactly what
//! was opened, written, toggled, and destroyed — and in what order.
//!
//! Keystrokes are injected through the sender returned by
//! [`MockEmulator::new`]; they appear on the emulator's input stream exactly
//! as a real user's typing would.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::application::bridge::{EmulatorError, TerminalEmulator};

/// Shared view into a [`MockEmulator`]'s records.
///
/// All fields are `Arc<Mutex<...>>` so the probe stays valid after the
/// emulator itself has been moved into a bridge.
#[derive(Clone, Default)]
pub struct MockEmulatorProbe {
    /// The `fullscreen` flag of each `open` call.
    pub opens: Arc<Mutex<Vec<bool>>>,
    /// Every chunk passed to `write`, in call order.
    pub writes: Arc<Mutex<Vec<Bytes>>>,
    /// The flag of each `toggle_fullscreen` call.
    pub fullscreen_toggles: Arc<Mutex<Vec<bool>>>,
    /// Number of `destroy` calls.
    pub destroy_count: Arc<Mutex<u32>>,
}

/// A terminal emulator that records all calls without touching the TTY.
pub struct MockEmulator {
    probe: MockEmulatorProbe,
    input: Option<mpsc::Receiver<Bytes>>,
    /// When `true`, `open` returns an error instead of recording.
    pub fail_open: bool,
    /// When `true`, `write` returns an error instead of recording.
    pub fail_writes: bool,
}

impl MockEmulator {
    /// Creates a mock emulator and the sender used to inject keystrokes.
    pub fn new() -> (Self, mpsc::Sender<Bytes>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Self {
                probe: MockEmulatorProbe::default(),
                input: Some(rx),
                fail_open: false,
                fail_writes: false,
            },
            tx,
        )
    }

    /// Returns a shared view into this emulator's records.
    pub fn probe(&self) -> MockEmulatorProbe {
        self.probe.clone()
    }
}

impl TerminalEmulator for MockEmulator {
    fn open(&mut self, fullscreen: bool) -> Result<(), EmulatorError> {
        if self.fail_open {
            return Err(EmulatorError::NotOpen);
        }
        self.probe.opens.lock().unwrap().push(fullscreen);
        Ok(())
    }

    fn take_input(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.input.take()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), EmulatorError> {
        if self.fail_writes {
            return Err(EmulatorError::NotOpen);
        }
        self.probe
            .writes
            .lock()
            .unwrap()
            .push(Bytes::copy_from_slice(data));
        Ok(())
    }

    fn toggle_fullscreen(&mut self, enabled: bool) {
        self.probe.fullscreen_toggles.lock().unwrap().push(enabled);
    }

    fn destroy(&mut self) {
        *self.probe.destroy_count.lock().unwrap() += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_keystrokes_appear_on_input_stream() {
        // Arrange
        let (mut emulator, keys) = MockEmulator::new();
        let mut input = emulator.take_input().unwrap();

        // Act
        keys.send(Bytes::from_static(b"whoami\r")).await.unwrap();

        // Assert
        assert_eq!(input.recv().await, Some(Bytes::from_static(b"whoami\r")));
    }

    #[test]
    fn test_writes_are_recorded_in_order() {
        let (mut emulator, _keys) = MockEmulator::new();
        let probe = emulator.probe();

        emulator.write(b"first").unwrap();
        emulator.write(b"second").unwrap();

        assert_eq!(
            *probe.writes.lock().unwrap(),
            vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]
        );
    }

    #[test]
    fn test_input_can_only_be_taken_once() {
        let (mut emulator, _keys) = MockEmulator::new();
        assert!(emulator.take_input().is_some());
        assert!(emulator.take_input().is_none());
    }

    #[test]
    fn test_fail_open_returns_error() {
        let (mut emulator, _keys) = MockEmulator::new();
        emulator.fail_open = true;
        assert!(emulator.open(true).is_err());
        assert!(emulator.probe().opens.lock().unwrap().is_empty());
    }

    #[test]
    fn test_destroy_is_counted() {
        let (mut emulator, _keys) = MockEmulator::new();
        let probe = emulator.probe();
        emulator.destroy();
        assert_eq!(*probe.destroy_count.lock().unwrap(), 1);
    }
}
