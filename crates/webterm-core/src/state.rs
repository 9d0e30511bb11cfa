//! The connection-attempt state machine.
//!
//! One connection attempt moves through at most five states:
//!
//! ```text
//! Idle ──> Negotiating ──> Connecting ──> Streaming ──> Closed
//!   ^           │               │
//!   └───────────┘               └───────────────────────> Closed
//!  (negotiation failed)        (channel failed before open)
//! ```
//!
//! `Idle` and `Negotiating` belong to the submission flow (the request has
//! not produced a channel yet); the stream bridge starts in `Connecting` and
//! owns the remaining transitions.  `Closed` is terminal for the attempt —
//! a fresh attempt starts a new machine, it never resurrects this one.
//!
//! Transitions are validated: the bridge advances the state through
//! [`ConnectionState::advance`], which rejects anything not in the diagram
//! above with a typed [`InvalidTransition`] instead of silently corrupting
//! the lifecycle.

use std::fmt;

use thiserror::Error;

/// Attempted state transition not permitted by the machine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid connection state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Where a connection attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No attempt in progress; the submission surface is actionable.
    Idle,
    /// The negotiation exchange is in flight.
    Negotiating,
    /// A channel has been requested but has not reported open yet.
    Connecting,
    /// The channel is open and both data paths are live.
    Streaming,
    /// The attempt is over.  Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns `true` when the machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Idle, Negotiating)
                | (Negotiating, Idle)
                | (Negotiating, Connecting)
                | (Connecting, Streaming)
                | (Connecting, Closed)
                | (Streaming, Closed)
        )
    }

    /// Returns `true` for states that end the attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed)
    }

    /// Moves the machine to `next`, rejecting transitions the lifecycle does
    /// not permit.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `next` is not reachable from the
    /// current state; the state is left unchanged in that case.
    pub fn advance(&mut self, next: ConnectionState) -> Result<(), InvalidTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Negotiating => "negotiating",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
