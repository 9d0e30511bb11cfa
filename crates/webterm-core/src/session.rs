//! Session handles and channel-address construction.
//!
//! A successful negotiation yields a [`SessionHandle`]: the gateway-issued
//! identifier for one pending remote connection.  The handle is opaque — the
//! client never inspects it — and is consumed exactly once, when the address
//! of the streaming channel is derived from it:
//!
//! ```text
//! origin  http://gateway.example:8886
//! handle  abc123
//!    →    ws://gateway.example:8886/ws?id=abc123
//! ```
//!
//! The scheme upgrade keeps the transport security of the origin: `http`
//! becomes `ws`, `https` becomes `wss`.
//!
//! [`SessionHandle`] is deliberately not `Clone`, and
//! [`SessionHandle::into_channel_url`] takes it by value: once a channel
//! address has been built the handle is gone, so a closed channel cannot be
//! reopened with a stale identifier.

use thiserror::Error;
use url::Url;

/// Fixed path of the session-stream endpoint on the gateway.
const CHANNEL_PATH: &str = "/ws";

/// Errors that can occur while deriving the channel address.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The origin's scheme has no streaming-channel equivalent.
    #[error("origin scheme '{0}' has no websocket equivalent (expected http or https)")]
    UnsupportedOrigin(String),
}

/// A gateway-issued identifier for one negotiated remote connection.
#[derive(Debug, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Wraps a gateway-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the handle and builds the streaming-channel address:
    /// the origin with its scheme upgraded to the websocket equivalent, the
    /// fixed channel path, and the session identifier as the `id` query
    /// parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnsupportedOrigin`] when the origin's scheme
    /// is neither `http` nor `https`.
    pub fn into_channel_url(self, origin: &Url) -> Result<Url, SessionError> {
        let ws_scheme = match origin.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(SessionError::UnsupportedOrigin(other.to_string())),
        };

        let mut url = origin.clone();
        // `set_scheme` only fails when crossing the special/non-special
        // boundary; http→ws and https→wss are both special-to-special.
        url.set_scheme(ws_scheme)
            .map_err(|_| SessionError::UnsupportedOrigin(origin.scheme().to_string()))?;
        url.set_path(CHANNEL_PATH);
        url.set_query(None);
        url.query_pairs_mut().append_pair("id", &self.0);
        Ok(url)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
