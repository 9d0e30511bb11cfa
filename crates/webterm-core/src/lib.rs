//! # webterm-core
//!
//! Shared library for WebTerm containing the connection-request model, the
//! session handle, and the connection state machine.
//!
//! This crate is the foundation under the client application.  It has zero
//! dependencies on async runtimes, network sockets, or terminal APIs, so
//! every type in it can be unit tested without any I/O in scope:
//!
//! - **`request`** – What the user asked for: the target protocol and host,
//!   the credentials, and the two local invariants enforced before anything
//!   touches the network (default-port fill, private-key size ceiling).
//!
//! - **`session`** – What the gateway answered with: an opaque session
//!   handle, and the one thing a handle is good for — deriving the address
//!   of the streaming channel.
//!
//! - **`state`** – Where a connection attempt currently is: the explicit
//!   state machine with validated transitions that the stream bridge drives.

pub mod request;
pub mod session;
pub mod state;

// Re-export the most-used types at the crate root so callers can write
// `webterm_core::ConnectionRequest` instead of spelling out the module path.
pub use request::{ConnectionRequest, Protocol, ValidationError, MAX_PRIVATE_KEY_BYTES};
pub use session::{SessionError, SessionHandle};
pub use state::{ConnectionState, InvalidTransition};
