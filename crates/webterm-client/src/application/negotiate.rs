//! Session negotiation: one request, one session handle.
//!
//! [`SessionNegotiator`] converts a validated [`ConnectionRequest`] into a
//! [`SessionHandle`] through exactly one exchange with the gateway's
//! session-issuing endpoint, or fails informatively.  It performs no retry;
//! retrying is the caller's decision (in practice: the user re-submits).
//!
//! The actual HTTP work happens behind the [`RequestTransport`] port so the
//! use case can be tested against a mock transport, and so the one enforced
//! local invariant — the private-key size ceiling — provably rejects a bad
//! request *before* anything reaches the network.
//!
//! # Error split
//!
//! - [`ValidationError`] — the request violates a local invariant; reported
//!   inline, the transport is never invoked.
//! - [`TransportError`] — the exchange failed or produced an unusable
//!   response.  [`TransportError::user_message`] yields the stable text to
//!   put on the status surface; transport internals stay in the logs.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use webterm_core::{ConnectionRequest, SessionHandle, ValidationError};

/// Gateway status value that marks a successful negotiation.
const STATUS_SUCCESS: &str = "success";

// ── Errors ────────────────────────────────────────────────────────────────────

/// The negotiation exchange failed or returned an unusable response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be completed (connect failure, timeout, ...).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status.
    #[error("unexpected http status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// The gateway processed the request but declined to open the session,
    /// e.g. the remote host was unreachable or rejected the credentials.
    #[error("gateway rejected connection: {0}")]
    Rejected(String),

    /// The response body was not the expected JSON shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The configured endpoint could not be constructed from the origin.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl TransportError {
    /// Returns the user-visible message for this failure.
    ///
    /// Transport faults all map to one stable retry message so that network
    /// internals never leak onto the status surface.  A gateway rejection is
    /// the exception: the gateway's own text is what the user needs to see.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Rejected(reason) => reason.clone(),
            _ => "connection to the server timed out, please retry".to_string(),
        }
    }
}

/// Any failure of the negotiation operation.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ── Transport port ────────────────────────────────────────────────────────────

/// Decoded body of the gateway's negotiation response.
///
/// The gateway answers `{"id": ..., "status": ...}`: `status` is the literal
/// `"success"` or an error text, and `id` may be absent or null when the
/// gateway failed to reach the remote host.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Port for the one-shot request/response exchange with the gateway.
///
/// An implementation posts the request fields as a structured multipart
/// payload (text fields plus the optional binary private key) and decodes
/// the JSON response.  One call is one exchange — no retry inside.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestTransport: Send + Sync {
    /// Submits the connection request and returns the decoded response.
    async fn submit(&self, request: &ConnectionRequest) -> Result<ConnectResponse, TransportError>;
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// The session negotiation use case.
pub struct SessionNegotiator<T: RequestTransport> {
    transport: T,
}

impl<T: RequestTransport> SessionNegotiator<T> {
    /// Creates a negotiator backed by the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Converts a validated connection request into a session handle.
    ///
    /// The request must already satisfy the [`ConnectionRequest`] invariants
    /// (default port filled); invalid input is rejected, not repaired.
    ///
    /// # Errors
    ///
    /// - [`NegotiationError::Validation`] when the private-key payload
    ///   exceeds the size ceiling; the transport is never invoked.
    /// - [`NegotiationError::Transport`] when the exchange fails, the
    ///   gateway reports a non-success status, or the response carries no
    ///   session identifier.
    pub async fn negotiate(
        &self,
        request: &ConnectionRequest,
    ) -> Result<SessionHandle, NegotiationError> {
        request.validate()?;

        debug!(protocol = %request.protocol, host = %request.host, port = %request.port,
               "submitting connection request");
        let response = self.transport.submit(request).await?;

        if let Some(status) = response.status.as_deref() {
            if status != STATUS_SUCCESS {
                return Err(TransportError::Rejected(status.to_string()).into());
            }
        }

        let id = response
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                TransportError::InvalidResponse(
                    "response did not contain a session id".to_string(),
                )
            })?;

        info!(session = %id, "session negotiated");
        Ok(SessionHandle::new(id))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
