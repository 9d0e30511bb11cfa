//! WebSocket adapter for the session-stream channel.
//!
//! [`WsChannel`] connects to the gateway's session-stream endpoint
//! (`<ws-scheme>://<origin>/ws?id=<handle>`) and adapts the socket to the
//! [`SessionChannel`] port.  One driver task per channel owns the socket:
//!
//! ```text
//!               events (mpsc)                    WebSocket
//! StreamBridge <────────────── drive_socket <──────────────> gateway
//!               outbound (mpsc)
//! StreamBridge ──────────────>
//! ```
//!
//! Inbound frames are forwarded through the event channel in arrival order,
//! one frame per [`ChannelEvent::Message`] — no coalescing.  Outbound bytes
//! are sent as text frames, because the gateway reads the socket in text
//! mode; inbound text and binary frames are both accepted verbatim.
//!
//! # The `Closed` guarantee
//!
//! The port contract requires `Closed` to be the final event on every event
//! stream.  A raw socket does not promise that: an I/O error, a failed
//! connect, or a bare EOF all end the connection without a close frame.
//! This adapter therefore synthesizes a reasonless `Closed` event after any
//! such ending, so the bridge's close handler — the single authoritative
//! teardown path — always runs.

pub mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, warn};
use url::Url;

use crate::application::bridge::{ChannelError, ChannelEvent, SessionChannel};

/// Capacity of the event and outbound channels.
///
/// Bounded so a stalled consumer applies backpressure to the socket instead
/// of buffering without limit.
const CHANNEL_CAPACITY: usize = 128;

/// A session channel backed by a WebSocket connection.
pub struct WsChannel {
    events: Option<mpsc::Receiver<ChannelEvent>>,
    outbound: mpsc::Sender<Bytes>,
}

impl WsChannel {
    /// Requests a channel at the given address and spawns its driver task.
    ///
    /// This never fails directly — exactly like a browser's WebSocket
    /// constructor, a connection failure surfaces on the event stream as an
    /// `Error` followed by the final `Closed`, and the bridge's close
    /// handler performs the teardown.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(url: Url) -> Self {
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(drive_socket(url, event_tx, out_rx));

        Self {
            events: Some(event_rx),
            outbound: out_tx,
        }
    }
}

#[async_trait]
impl SessionChannel for WsChannel {
    fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
        self.events.take()
    }

    async fn send(&mut self, data: Bytes) -> Result<(), ChannelError> {
        self.outbound
            .send(data)
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

// ── Driver task ───────────────────────────────────────────────────────────────

/// Owns the socket for the lifetime of one channel.
///
/// Emits `Open` after the handshake, forwards frames in both directions, and
/// always finishes the event stream with a `Closed` event.
async fn drive_socket(
    url: Url,
    events: mpsc::Sender<ChannelEvent>,
    mut outbound: mpsc::Receiver<Bytes>,
) {
    // `connect_async` performs the TCP connect and the RFC 6455 upgrade.
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(%err, "channel connect failed");
            let _ = events.send(ChannelEvent::Error(err.to_string())).await;
            let _ = events.send(ChannelEvent::Closed { reason: None }).await;
            return;
        }
    };

    debug!(%url, "channel open");
    if events.send(ChannelEvent::Open).await.is_err() {
        return;
    }

    let (mut sink, mut stream) = ws_stream.split();
    let mut outbound_open = true;

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if events
                        .send(ChannelEvent::Message(Bytes::from(text.into_bytes())))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    if events
                        .send(ChannelEvent::Message(Bytes::from(data)))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame.and_then(|f| {
                        if f.reason.is_empty() {
                            None
                        } else {
                            Some(f.reason.to_string())
                        }
                    });
                    let _ = events.send(ChannelEvent::Closed { reason }).await;
                    return;
                }
                Some(Ok(_)) => {
                    // Ping/Pong/raw frames: protocol plumbing that
                    // tokio-tungstenite already answers for us.
                }
                Some(Err(err)) => {
                    warn!(%err, "channel transport error");
                    let _ = events.send(ChannelEvent::Error(err.to_string())).await;
                    let _ = events.send(ChannelEvent::Closed { reason: None }).await;
                    return;
                }
                None => {
                    // EOF without a close frame.
                    let _ = events.send(ChannelEvent::Closed { reason: None }).await;
                    return;
                }
            },
            maybe = outbound.recv(), if outbound_open => match maybe {
                Some(data) => {
                    // The gateway reads text frames; terminal input is UTF-8
                    // in practice, so a lossy conversion never alters it.
                    let text = String::from_utf8_lossy(&data).into_owned();
                    if let Err(err) = sink.send(WsMessage::Text(text)).await {
                        warn!(%err, "channel send failed");
                        let _ = events.send(ChannelEvent::Error(err.to_string())).await;
                        let _ = events.send(ChannelEvent::Closed { reason: None }).await;
                        return;
                    }
                }
                None => {
                    // The channel handle is gone: start a clean close and keep
                    // reading until the peer acknowledges it.
                    let _ = sink.send(WsMessage::Close(None)).await;
                    outbound_open = false;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
