//! Infrastructure layer: production adapters for the application ports.
//!
//! - [`http`] — `ReqwestTransport`, the multipart HTTP adapter for the
//!   `RequestTransport` port.
//! - [`channel`] — `WsChannel`, the WebSocket adapter for the
//!   `SessionChannel` port (plus the scripted fake used in tests).
//! - [`emulator`] — `TtyEmulator`, the local-TTY adapter for the
//!   `TerminalEmulator` port (plus the recording mock used in tests).
//! - [`ui_bridge`] — `ConnectPanel`, the owner of the connection-request
//!   surface state.

pub mod channel;
pub mod emulator;
pub mod http;
pub mod ui_bridge;
