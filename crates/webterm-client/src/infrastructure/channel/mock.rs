//! Scripted fake session channel for tests.
//!
//! # Why a fake channel?
//!
//! The real [`WsChannel`](super::WsChannel) needs a listening WebSocket
//! server.  The `FakeChannel` replaces the socket with an in-memory event
//! queue: the test holds the sender half and scripts any sequence of
//! [`ChannelEvent`]s, while everything the bridge sends outbound is recorded
//! for inspection.
//!
//! # Usage in tests
//!
//! ```ignore
//! let (channel, script) = FakeChannel::new();
//! let sent = channel.sent_probe();
//!
//! script.send(ChannelEvent::Open).await.unwrap();
//! script.send(ChannelEvent::Closed { reason: None }).await.unwrap();
//!
//! // ... run the bridge, then:
//! assert!(sent.lock().unwrap().is_empty());
//! ```
//!
//! # `fail_sends` flag
//!
//! Set `fail_sends = true` to make every outbound send return
//! [`ChannelError::Send`].  Failed attempts are still counted (but not
//! recorded as sent), so tests can wait for the attempt before moving on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::application::bridge::{ChannelError, ChannelEvent, SessionChannel};

/// A session channel driven by a test script instead of a socket.
pub struct FakeChannel {
    events: Option<mpsc::Receiver<ChannelEvent>>,
    sent: Arc<Mutex<Vec<Bytes>>>,
    send_attempts: Arc<AtomicUsize>,
    /// When `true`, every send returns an error (after counting the attempt).
    pub fail_sends: bool,
}

impl FakeChannel {
    /// Creates a fake channel and the sender used to script its events.
    pub fn new() -> (Self, mpsc::Sender<ChannelEvent>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Self {
                events: Some(rx),
                sent: Arc::new(Mutex::new(Vec::new())),
                send_attempts: Arc::new(AtomicUsize::new(0)),
                fail_sends: false,
            },
            tx,
        )
    }

    /// Returns a handle to the outbound-send record.
    pub fn sent_probe(&self) -> Arc<Mutex<Vec<Bytes>>> {
        Arc::clone(&self.sent)
    }

    /// Returns a handle to the outbound-attempt counter (successful or not).
    pub fn attempts_probe(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.send_attempts)
    }
}

#[async_trait]
impl SessionChannel for FakeChannel {
    fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
        self.events.take()
    }

    async fn send(&mut self, data: Bytes) -> Result<(), ChannelError> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_sends {
            return Err(ChannelError::Send("scripted failure".to_string()));
        }
        self.sent.lock().unwrap().push(data);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_events_are_delivered_in_order() {
        // Arrange
        let (mut channel, script) = FakeChannel::new();
        script.send(ChannelEvent::Open).await.unwrap();
        script
            .send(ChannelEvent::Closed { reason: None })
            .await
            .unwrap();

        // Act
        let mut events = channel.take_events().unwrap();

        // Assert
        assert_eq!(events.recv().await, Some(ChannelEvent::Open));
        assert_eq!(
            events.recv().await,
            Some(ChannelEvent::Closed { reason: None })
        );
    }

    #[tokio::test]
    async fn test_events_can_only_be_taken_once() {
        let (mut channel, _script) = FakeChannel::new();
        assert!(channel.take_events().is_some());
        assert!(channel.take_events().is_none());
    }

    #[tokio::test]
    async fn test_sends_are_recorded() {
        let (mut channel, _script) = FakeChannel::new();
        let sent = channel.sent_probe();

        channel.send(Bytes::from_static(b"abc")).await.unwrap();

        assert_eq!(*sent.lock().unwrap(), vec![Bytes::from_static(b"abc")]);
        assert_eq!(channel.attempts_probe().load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fail_sends_counts_but_does_not_record() {
        let (mut channel, _script) = FakeChannel::new();
        channel.fail_sends = true;
        let sent = channel.sent_probe();

        let result = channel.send(Bytes::from_static(b"abc")).await;

        assert!(matches!(result, Err(ChannelError::Send(_))));
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(channel.attempts_probe().load(Ordering::SeqCst), 1);
    }
}
