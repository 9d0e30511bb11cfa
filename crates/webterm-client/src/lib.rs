//! webterm-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the binary entry point in `main.rs` share the same module tree.
//!
//! # What does webterm-client do?
//!
//! The client talks to a WebTerm gateway in two steps:
//!
//! 1. **Negotiation** – a single multipart POST to `<origin>/connect`
//!    carrying the user's connection request (protocol, host, port,
//!    credentials).  The gateway dials the remote host and answers with a
//!    session identifier.
//! 2. **Streaming** – a WebSocket opened at `<ws-scheme>://<origin>/ws?id=…`
//!    carries raw terminal bytes in both directions: local keystrokes out,
//!    remote output in.  The stream bridge owns this phase, including the
//!    connection state machine and the teardown that restores the submission
//!    surface when the channel closes.

/// Domain layer: client configuration.
pub mod domain;

/// Application layer: session negotiation and the stream bridge.
pub mod application;

/// Infrastructure layer: HTTP transport, WebSocket channel, TTY emulator,
/// and the connect-panel UI surface.
pub mod infrastructure;
