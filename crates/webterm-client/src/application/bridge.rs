//! The stream bridge: one terminal session from handle to teardown.
//!
//! [`StreamBridge`] owns the live pairing of {channel, emulator} for exactly
//! one connection attempt.  It drives the connection state machine:
//!
//! ```text
//! Connecting ──(channel Open)──> Streaming ──(channel Closed)──> Closed
//!     │                                                            ^
//!     └──────────────(channel Closed / stream ended)───────────────┘
//! ```
//!
//! Entry actions:
//!
//! - **Streaming**: hide the connection-request surface, open the emulator
//!   full-screen interactive.
//! - **Closed**: destroy the emulator, restore the connection-request
//!   surface, surface the close reason verbatim as the status text,
//!   re-enable the submission control.
//!
//! While streaming, two independent data paths are live:
//!
//! - emulator → channel: each input chunk is forwarded verbatim, unbuffered,
//!   in arrival order;
//! - channel → emulator: each inbound message is one write, verbatim, in
//!   arrival order.
//!
//! No relative ordering is guaranteed across the two directions.
//!
//! # Error events never strand the UI
//!
//! A [`ChannelEvent::Error`] is diagnostic only: it is logged and does not
//! transition state.  The close event is the single authoritative teardown
//! path.  Two guarantees make that safe: the [`SessionChannel`] contract
//! requires `Closed` to be the final event on every stream (even after an
//! error), and the bridge treats an event stream that ends without `Closed`
//! as a reasonless close.  Either way the submission control is re-enabled.
//!
//! `Closed` is terminal for the attempt.  A fresh attempt constructs a new
//! bridge with a new channel and a new emulator; nothing carries over, and
//! in particular there is no automatic reconnect.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use webterm_core::{ConnectionState, InvalidTransition};

// ── Events and errors ─────────────────────────────────────────────────────────

/// Signals emitted by a session channel, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel is open; streaming may begin.
    Open,
    /// An inbound message carrying raw terminal output.
    Message(Bytes),
    /// A transport-level fault.  Diagnostic only; a `Closed` event follows.
    Error(String),
    /// The channel is closed, with the peer-supplied reason if any.
    /// Always the final event on the stream.
    Closed { reason: Option<String> },
}

/// Outbound-direction fault on a session channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel is no longer accepting outbound data.
    #[error("channel is closed")]
    Closed,
    /// The transport reported a send failure.
    #[error("channel send failed: {0}")]
    Send(String),
}

/// Fault in the terminal-emulator capability.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("emulator is not open")]
    NotOpen,
}

/// Failure of the bridge itself (as opposed to a normal channel close).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The channel's event stream was already taken by someone else.
    #[error("channel event stream was already taken")]
    EventsUnavailable,
    /// The emulator's input stream was already taken by someone else.
    #[error("emulator input stream was already taken")]
    InputUnavailable,
    #[error(transparent)]
    State(#[from] InvalidTransition),
    #[error(transparent)]
    Emulator(#[from] EmulatorError),
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Port for the persistent duplex streaming channel.
///
/// # Contract
///
/// - Events are delivered in arrival order; no reordering, no batching.
/// - `Closed` is the final event on every event stream, including after an
///   `Error` event.  An adapter that can observe an error without a
///   transport-level close must synthesize the `Closed` event itself.
#[async_trait]
pub trait SessionChannel: Send {
    /// Takes the channel's event stream.  Yields `None` on second call.
    fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>>;

    /// Sends raw terminal input on the outbound direction.
    async fn send(&mut self, data: Bytes) -> Result<(), ChannelError>;
}

/// Port for the terminal-emulator capability.
///
/// The emulator displays inbound bytes and produces the user's keystrokes as
/// an input byte stream.  Rendering internals (cursor movement, escape
/// sequences) are the emulator's business; the bridge passes bytes through
/// verbatim in both directions.
pub trait TerminalEmulator: Send {
    /// Attaches the emulator to its display, optionally full-screen.
    fn open(&mut self, fullscreen: bool) -> Result<(), EmulatorError>;

    /// Takes the emulator's input stream.  Yields `None` on second call.
    fn take_input(&mut self) -> Option<mpsc::Receiver<Bytes>>;

    /// Writes one chunk of terminal output to the display.
    fn write(&mut self, data: &[u8]) -> Result<(), EmulatorError>;

    /// Switches full-screen mode on or off.
    fn toggle_fullscreen(&mut self, enabled: bool);

    /// Tears the emulator down and releases its resources.
    fn destroy(&mut self);
}

/// Port for the connection-request surface.
///
/// The three pieces of UI state the bridge mutates — status text, request
/// form visibility, submission control — are owned by the implementation and
/// only ever touched through this port, so concurrent sessions cannot
/// clobber each other's surface.
pub trait UiSurface: Send {
    /// Sets the user-visible status text.
    fn set_status(&mut self, text: &str);

    /// Shows or hides the connection-request region.
    fn set_form_visible(&mut self, visible: bool);

    /// Enables or disables the submission control.
    fn set_submit_enabled(&mut self, enabled: bool);
}

// Forwarding impls so a caller can lend a mutable borrow to the bridge and
// inspect the adapter again once the bridge has finished.

impl<E: TerminalEmulator + ?Sized> TerminalEmulator for &mut E {
    fn open(&mut self, fullscreen: bool) -> Result<(), EmulatorError> {
        (**self).open(fullscreen)
    }
    fn take_input(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        (**self).take_input()
    }
    fn write(&mut self, data: &[u8]) -> Result<(), EmulatorError> {
        (**self).write(data)
    }
    fn toggle_fullscreen(&mut self, enabled: bool) {
        (**self).toggle_fullscreen(enabled)
    }
    fn destroy(&mut self) {
        (**self).destroy()
    }
}

impl<U: UiSurface + ?Sized> UiSurface for &mut U {
    fn set_status(&mut self, text: &str) {
        (**self).set_status(text)
    }
    fn set_form_visible(&mut self, visible: bool) {
        (**self).set_form_visible(visible)
    }
    fn set_submit_enabled(&mut self, enabled: bool) {
        (**self).set_submit_enabled(enabled)
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// How a terminal session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutcome {
    /// The close reason supplied by the peer, if any.  Already surfaced
    /// verbatim as the status text by the time the bridge returns.
    pub close_reason: Option<String>,
}

// ── The bridge ────────────────────────────────────────────────────────────────

/// Owns the full lifecycle of one terminal session.
///
/// Construction puts the machine in `Connecting`; [`StreamBridge::run`]
/// drives it to `Closed` and returns the outcome.  The channel and emulator
/// are consumed with the bridge, so a finished session cannot be restarted —
/// a fresh attempt needs fresh instances of all three.
pub struct StreamBridge<C, E, U>
where
    C: SessionChannel,
    E: TerminalEmulator,
    U: UiSurface,
{
    channel: C,
    emulator: E,
    ui: U,
    state: ConnectionState,
}

impl<C, E, U> StreamBridge<C, E, U>
where
    C: SessionChannel,
    E: TerminalEmulator,
    U: UiSurface,
{
    /// Creates a bridge for a freshly requested channel.
    pub fn new(channel: C, emulator: E, ui: U) -> Self {
        Self {
            channel,
            emulator,
            ui,
            state: ConnectionState::Connecting,
        }
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Runs the session to completion.
    ///
    /// Suspends on the channel's event stream and the emulator's input
    /// stream; returns when the channel closes (the normal path) or when an
    /// emulator fault forces teardown.  On every exit path — including the
    /// error ones — the connection-request surface has been restored and the
    /// submission control re-enabled before this function returns.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] when an event or input stream was already
    /// taken, or when an emulator operation fails.  Teardown has already run
    /// in the latter case.
    pub async fn run(mut self) -> Result<BridgeOutcome, BridgeError> {
        let mut events = self
            .channel
            .take_events()
            .ok_or(BridgeError::EventsUnavailable)?;
        let mut input = self
            .emulator
            .take_input()
            .ok_or(BridgeError::InputUnavailable)?;
        let mut input_open = true;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(ChannelEvent::Open) => {
                        if let Err(err) = self.enter_streaming() {
                            self.teardown(Some(err.to_string()));
                            return Err(err);
                        }
                    }
                    Some(ChannelEvent::Message(data)) => {
                        if self.state != ConnectionState::Streaming {
                            warn!(len = data.len(), "dropping channel message received before open");
                            continue;
                        }
                        if let Err(err) = self.emulator.write(&data) {
                            let err = BridgeError::from(err);
                            self.teardown(Some(err.to_string()));
                            return Err(err);
                        }
                    }
                    Some(ChannelEvent::Error(detail)) => {
                        // Diagnostic only.  The close event that follows is the
                        // single authoritative teardown path.
                        warn!(%detail, "channel error");
                    }
                    Some(ChannelEvent::Closed { reason }) => {
                        return Ok(self.teardown(reason));
                    }
                    None => {
                        debug!("channel event stream ended without a close event");
                        return Ok(self.teardown(None));
                    }
                },
                maybe = input.recv(), if input_open => match maybe {
                    Some(data) => {
                        if self.state != ConnectionState::Streaming {
                            continue;
                        }
                        if let Err(err) = self.channel.send(data).await {
                            // Outbound faults behave like channel errors: logged,
                            // superseded by the close event.
                            warn!(%err, "failed to forward terminal input");
                        }
                    }
                    None => input_open = false,
                },
            }
        }
    }

    /// Entry actions for `Streaming`.
    fn enter_streaming(&mut self) -> Result<(), BridgeError> {
        self.state.advance(ConnectionState::Streaming)?;
        self.ui.set_form_visible(false);
        self.emulator.open(true)?;
        self.emulator.toggle_fullscreen(true);
        debug!(state = %self.state, "channel open; terminal attached");
        Ok(())
    }

    /// Entry actions for `Closed`.  The close event is authoritative, so
    /// this runs regardless of which state the attempt was in.
    fn teardown(&mut self, reason: Option<String>) -> BridgeOutcome {
        self.emulator.destroy();
        self.ui.set_form_visible(true);
        self.ui.set_status(reason.as_deref().unwrap_or(""));
        self.ui.set_submit_enabled(true);
        self.state = ConnectionState::Closed;
        debug!(state = %self.state, reason = reason.as_deref().unwrap_or(""),
               "terminal session ended");
        BridgeOutcome {
            close_reason: reason,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::infrastructure::channel::mock::FakeChannel;
    use crate::infrastructure::emulator::mock::{MockEmulator, MockEmulatorProbe};
    use crate::infrastructure::ui_bridge::ConnectPanel;

    fn parts() -> (
        FakeChannel,
        mpsc::Sender<ChannelEvent>,
        MockEmulator,
        MockEmulatorProbe,
        mpsc::Sender<Bytes>,
        ConnectPanel,
    ) {
        let (channel, script) = FakeChannel::new();
        let (emulator, keys) = MockEmulator::new();
        let probe = emulator.probe();
        (channel, script, emulator, probe, keys, ConnectPanel::new())
    }

    #[test]
    fn test_bridge_starts_in_connecting() {
        let (channel, _script, emulator, _probe, _keys, ui) = parts();
        let bridge = StreamBridge::new(channel, emulator, ui);
        assert_eq!(bridge.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_open_messages_close_reach_emulator_in_order() {
        // Arrange: the §8 script — open, "hello", "world", close("bye")
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Message(Bytes::from_static(b"hello")))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Message(Bytes::from_static(b"world")))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Closed {
                reason: Some("bye".to_string()),
            })
            .await
            .unwrap();

        // Act
        let outcome = StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        // Assert: writes arrive verbatim and in order, the reason is surfaced
        assert_eq!(
            *probe.writes.lock().unwrap(),
            vec![Bytes::from_static(b"hello"), Bytes::from_static(b"world")]
        );
        assert_eq!(outcome.close_reason.as_deref(), Some("bye"));
        assert_eq!(ui.status(), "bye");
    }

    #[tokio::test]
    async fn test_open_attaches_emulator_fullscreen() {
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();

        StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert_eq!(*probe.opens.lock().unwrap(), vec![true]);
        assert_eq!(*probe.fullscreen_toggles.lock().unwrap(), vec![true]);
        // The form was hidden on open and restored on close.
        assert!(ui.form_visible());
    }

    #[tokio::test]
    async fn test_close_restores_ui_and_destroys_emulator() {
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Closed {
                reason: Some("session ended".to_string()),
            })
            .await
            .unwrap();

        StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert_eq!(*probe.destroy_count.lock().unwrap(), 1);
        assert!(ui.form_visible());
        assert!(ui.submit_enabled());
        assert_eq!(ui.status(), "session ended");
    }

    #[tokio::test]
    async fn test_error_then_reasonless_close_leaves_ui_actionable() {
        // The latent-gap scenario: an error event, then a close with no
        // reason.  The UI must end actionable either way.
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Error("connection reset".to_string()))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();

        let outcome = StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert!(outcome.close_reason.is_none());
        assert!(ui.submit_enabled());
        assert!(ui.form_visible());
        assert_eq!(ui.status(), "");
        assert_eq!(*probe.destroy_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_error_alone_does_not_transition_state() {
        // An error with no close yet: the bridge keeps streaming.  Verified
        // by sending a message after the error and seeing it written.
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Error("hiccup".to_string()))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Message(Bytes::from_static(b"still here")))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();

        StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert_eq!(
            *probe.writes.lock().unwrap(),
            vec![Bytes::from_static(b"still here")]
        );
    }

    #[tokio::test]
    async fn test_event_stream_ending_without_close_still_tears_down() {
        // Adapter misbehaviour: the stream ends with no Closed event.  The
        // bridge must still restore the UI rather than deadlock it.
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script.send(ChannelEvent::Open).await.unwrap();
        drop(script);

        let outcome = StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert!(outcome.close_reason.is_none());
        assert!(ui.submit_enabled());
        assert_eq!(*probe.destroy_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_input_is_forwarded_verbatim_in_order() {
        // Arrange
        let (channel, script, emulator, probe, keys, ui) = parts();
        let sent = channel.sent_probe();

        // Act: run the bridge concurrently and drive it step by step.
        let session = tokio::spawn(StreamBridge::new(channel, emulator, ui).run());

        script.send(ChannelEvent::Open).await.unwrap();
        // Wait for the open entry actions before typing.
        while probe.opens.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        keys.send(Bytes::from_static(b"ls -l")).await.unwrap();
        keys.send(Bytes::from_static(b"\r")).await.unwrap();
        // Both chunks must cross the bridge before the close lands.
        while sent.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }

        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();
        session.await.unwrap().unwrap();

        // Assert: content and order preserved
        assert_eq!(
            *sent.lock().unwrap(),
            vec![Bytes::from_static(b"ls -l"), Bytes::from_static(b"\r")]
        );
    }

    #[tokio::test]
    async fn test_message_before_open_is_dropped() {
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script
            .send(ChannelEvent::Message(Bytes::from_static(b"too early")))
            .await
            .unwrap();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();

        StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert!(probe.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_before_open_still_restores_ui() {
        // Channel failed before it ever opened (e.g. the gateway refused the
        // upgrade): Connecting → Closed.
        let (channel, script, emulator, probe, _keys, mut ui) = parts();
        script
            .send(ChannelEvent::Error("connect failed".to_string()))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();

        StreamBridge::new(channel, emulator, &mut ui)
            .run()
            .await
            .unwrap();

        assert!(ui.submit_enabled());
        assert!(ui.form_visible());
        assert!(
            probe.opens.lock().unwrap().is_empty(),
            "emulator never attached"
        );
        assert_eq!(*probe.destroy_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_emulator_open_failure_tears_down_before_erroring() {
        // Arrange: the emulator refuses to open
        let (channel, script, mut emulator, probe, _keys, mut ui) = parts();
        emulator.fail_open = true;
        script.send(ChannelEvent::Open).await.unwrap();

        // Act
        let result = StreamBridge::new(channel, emulator, &mut ui).run().await;

        // Assert: the error propagates, but the UI was restored first
        assert!(matches!(result, Err(BridgeError::Emulator(_))));
        assert!(ui.submit_enabled());
        assert!(ui.form_visible());
        assert_eq!(*probe.destroy_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_is_logged_not_fatal() {
        // Outbound faults must not tear the session down by themselves.
        let (mut channel, script) = FakeChannel::new();
        channel.fail_sends = true;
        let attempts = channel.attempts_probe();
        let (emulator, keys) = MockEmulator::new();
        let probe = emulator.probe();

        let session =
            tokio::spawn(StreamBridge::new(channel, emulator, ConnectPanel::new()).run());

        script.send(ChannelEvent::Open).await.unwrap();
        while probe.opens.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        keys.send(Bytes::from_static(b"x")).await.unwrap();
        while attempts.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        // The inbound path must keep working after the failed send.
        script
            .send(ChannelEvent::Message(Bytes::from_static(b"after")))
            .await
            .unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();
        session.await.unwrap().unwrap();

        assert_eq!(
            *probe.writes.lock().unwrap(),
            vec![Bytes::from_static(b"after")]
        );
    }
}
