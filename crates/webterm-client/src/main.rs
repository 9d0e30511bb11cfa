//! WebTerm client — entry point.
//!
//! Negotiates a remote terminal session (Telnet/SSH) with a WebTerm gateway
//! and bridges the local terminal to it over a WebSocket channel.
//!
//! # Usage
//!
//! ```text
//! webterm [OPTIONS] --host <HOST>
//!
//! Options:
//!   --server <URL>        Gateway origin [default: http://127.0.0.1:8886]
//!   --protocol <NAME>     telnet or ssh [default: ssh]
//!   --host <HOST>         Remote hostname or IP address
//!   --port <PORT>         Remote port [default: the protocol's well-known port]
//!   --username <NAME>     Login name on the remote host
//!   --password <PASS>     Login password
//!   --private-key <PATH>  Private key file (ssh)
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                  | Default                 | Description              |
//! |---------------------------|-------------------------|--------------------------|
//! | `WEBTERM_SERVER`          | `http://127.0.0.1:8886` | Gateway origin           |
//! | `WEBTERM_PROTOCOL`        | `ssh`                   | Remote protocol          |
//! | `WEBTERM_PASSWORD`        | (empty)                 | Login password           |
//! | `WEBTERM_CONNECT_TIMEOUT` | `3`                     | Negotiation connect (s)  |
//! | `WEBTERM_REQUEST_TIMEOUT` | `8`                     | Negotiation request (s)  |
//!
//! # Session flow
//!
//! ```text
//! main()
//!  └─ SessionNegotiator::negotiate()   -- POST /connect → session id
//!  └─ SessionHandle::into_channel_url  -- ws://<origin>/ws?id=<id>
//!  └─ StreamBridge::run()              -- WsChannel ↔ TtyEmulator
//!       └─ channel closes → TTY restored, close reason printed
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use webterm_client::application::{
    NegotiationError, SessionNegotiator, StreamBridge, UiSurface,
};
use webterm_client::domain::ClientConfig;
use webterm_client::infrastructure::channel::WsChannel;
use webterm_client::infrastructure::emulator::TtyEmulator;
use webterm_client::infrastructure::http::ReqwestTransport;
use webterm_client::infrastructure::ui_bridge::ConnectPanel;
use webterm_core::{ConnectionRequest, Protocol};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebTerm client.
///
/// Negotiates a Telnet/SSH session with a WebTerm gateway and streams the
/// terminal over a WebSocket channel.
#[derive(Debug, Parser)]
#[command(
    name = "webterm",
    about = "Terminal client for a WebTerm gateway (Telnet/SSH over WebSocket)",
    version
)]
struct Cli {
    /// Gateway origin URL (http or https).
    ///
    /// The negotiation endpoint is `<server>/connect`; the session stream is
    /// the same origin with the scheme upgraded to ws/wss and path `/ws`.
    #[arg(long, default_value = "http://127.0.0.1:8886", env = "WEBTERM_SERVER")]
    server: String,

    /// Remote protocol: `telnet` or `ssh`.
    #[arg(long, default_value = "ssh", env = "WEBTERM_PROTOCOL")]
    protocol: String,

    /// Remote hostname or IP address.
    #[arg(long)]
    host: String,

    /// Remote port.
    ///
    /// When omitted, the protocol's well-known port is used (telnet → 23,
    /// ssh → 22).
    #[arg(long)]
    port: Option<String>,

    /// Login name on the remote host.
    #[arg(long, default_value = "")]
    username: String,

    /// Login password.
    #[arg(long, default_value = "", env = "WEBTERM_PASSWORD")]
    password: String,

    /// Path to a private key file (ssh).
    ///
    /// The key is uploaded to the gateway with the request; payloads over
    /// 16384 bytes are rejected locally, before anything is transmitted.
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Negotiation TCP connect timeout in seconds.
    #[arg(long, default_value_t = 3, env = "WEBTERM_CONNECT_TIMEOUT")]
    connect_timeout: u64,

    /// Negotiation request timeout in seconds.
    #[arg(long, default_value_t = 8, env = "WEBTERM_REQUEST_TIMEOUT")]
    request_timeout: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--server` is not a valid URL.
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let origin = Url::parse(&self.server)
            .with_context(|| format!("invalid gateway origin: '{}'", self.server))?;
        Ok(ClientConfig {
            origin,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
        })
    }

    /// Builds the connection request, reading the private key file and
    /// filling the default port for the chosen protocol.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported protocol name or an unreadable
    /// key file.
    fn connection_request(&self) -> anyhow::Result<ConnectionRequest> {
        let protocol: Protocol = self.protocol.parse()?;

        let private_key = match &self.private_key {
            Some(path) => Some(
                std::fs::read(path)
                    .with_context(|| format!("failed to read private key '{}'", path.display()))?,
            ),
            None => None,
        };

        let mut request = ConnectionRequest {
            protocol,
            host: self.host.clone(),
            port: self.port.clone().unwrap_or_default(),
            username: self.username.clone(),
            password: self.password.clone(),
            private_key,
        };
        // Default-port population is the submission surface's job; the
        // negotiator only ever sees a request with the invariant satisfied.
        request.fill_default_port();
        Ok(request)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level is controlled by RUST_LOG; default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    run(cli).await
}

/// One connection attempt: negotiate, stream, restore.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.client_config()?;
    let request = cli.connection_request()?;

    let mut panel = ConnectPanel::new();
    panel.set_submit_enabled(false);

    // ── Negotiation ───────────────────────────────────────────────────────────
    let transport = ReqwestTransport::new(&config)?;
    let negotiator = SessionNegotiator::new(transport);

    let handle = match negotiator.negotiate(&request).await {
        Ok(handle) => handle,
        Err(err) => {
            // Every failure path ends with an actionable surface: status set,
            // submission re-enabled.
            let message = match &err {
                NegotiationError::Validation(v) => v.to_string(),
                NegotiationError::Transport(t) => t.user_message(),
            };
            panel.set_status(&message);
            panel.set_submit_enabled(true);
            error!(%err, "negotiation failed");
            anyhow::bail!("{message}");
        }
    };

    // ── Streaming ─────────────────────────────────────────────────────────────
    let channel_url = handle.into_channel_url(&config.origin)?;
    info!(%channel_url, "opening session channel");

    let channel = WsChannel::connect(channel_url);
    let emulator = TtyEmulator::new();
    let outcome = StreamBridge::new(channel, emulator, &mut panel).run().await?;

    // The TTY is back to normal here; surface the close reason, if any.
    if let Some(reason) = &outcome.close_reason {
        eprintln!("{reason}");
    }
    info!("session closed");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
