//! Application layer: use cases for the client.
//!
//! - [`negotiate`] — turn a validated connection request into a session
//!   handle through one exchange with the gateway.
//! - [`bridge`] — own the lifecycle of one streaming terminal session, from
//!   handle to teardown.
//!
//! Both use cases depend only on ports (traits); the production adapters
//! live in the infrastructure layer.

pub mod bridge;
pub mod negotiate;

pub use bridge::{
    BridgeError, BridgeOutcome, ChannelError, ChannelEvent, EmulatorError, SessionChannel,
    StreamBridge, TerminalEmulator, UiSurface,
};
pub use negotiate::{
    ConnectResponse, NegotiationError, RequestTransport, SessionNegotiator, TransportError,
};
