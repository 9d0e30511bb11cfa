//! Client configuration types.
//!
//! [`ClientConfig`] is the single source of truth for all runtime settings.
//! It can be constructed from CLI arguments (preferred for production) or
//! from sensible defaults (useful for local development and tests).
//!
//! Configuration stays a plain struct — no global state, no environment
//! variable reads inside the domain.  The binary entry point is responsible
//! for populating it from CLI args or environment variables.

use std::time::Duration;

use url::Url;

/// All runtime configuration for the WebTerm client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The gateway's HTTP origin.
    ///
    /// The negotiation endpoint lives at `<origin>/connect`; the streaming
    /// channel lives at the same origin with the scheme upgraded to its
    /// websocket equivalent and path `/ws`.
    pub origin: Url,

    /// Maximum time to wait for the TCP connection of the negotiation
    /// request to be established.
    pub connect_timeout: Duration,

    /// Maximum total time for the negotiation request/response exchange.
    ///
    /// This is the only timeout in the system; the streaming phase has none.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    /// Returns a `ClientConfig` suitable for a gateway running locally on
    /// its default port.
    ///
    /// | Field           | Default                 |
    /// |-----------------|-------------------------|
    /// | origin          | `http://127.0.0.1:8886` |
    /// | connect_timeout | 3 seconds               |
    /// | request_timeout | 8 seconds               |
    fn default() -> Self {
        Self {
            // Compile-time-known valid URL.
            origin: Url::parse("http://127.0.0.1:8886").unwrap(),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(8),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin_is_local_gateway() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.origin.as_str(), "http://127.0.0.1:8886/");
    }

    #[test]
    fn test_default_timeouts() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(3));
        assert_eq!(cfg.request_timeout, Duration::from_secs(8));
    }

    #[test]
    fn test_config_can_be_cloned() {
        let cfg = ClientConfig::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.origin, cloned.origin);
    }
}
