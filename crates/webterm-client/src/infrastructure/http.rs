//! HTTP adapter for the negotiation exchange.
//!
//! [`ReqwestTransport`] posts the connection request to the gateway's
//! `/connect` endpoint as a multipart form — text fields for the protocol,
//! target, and credentials, plus an optional binary part for the private
//! key — and decodes the JSON response.
//!
//! The field names mirror what the gateway's form handler expects:
//!
//! | Part         | Content                         |
//! |--------------|---------------------------------|
//! | `protocol`   | `telnet` or `ssh`               |
//! | `hostname`   | target host                     |
//! | `port`       | target port (always filled)     |
//! | `username`   | login name                      |
//! | `password`   | login password                  |
//! | `privatekey` | binary key payload, when given  |
//!
//! Timeouts are the only ones in the system: the negotiation phase is
//! bounded by the config's connect and request timeouts, while the
//! streaming phase that follows has none.

use async_trait::async_trait;
use reqwest::multipart;
use tracing::debug;
use url::Url;

use webterm_core::ConnectionRequest;

use crate::application::negotiate::{ConnectResponse, RequestTransport, TransportError};
use crate::domain::ClientConfig;

/// Path of the session-issuing endpoint, relative to the gateway origin.
const CONNECT_PATH: &str = "connect";

/// The production request transport, backed by a reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl ReqwestTransport {
    /// Builds a transport for the configured gateway.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the HTTP client cannot be constructed
    /// or the `/connect` endpoint cannot be derived from the origin.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        let endpoint = config.origin.join(CONNECT_PATH).map_err(|err| {
            TransportError::InvalidEndpoint(format!(
                "cannot derive connect endpoint from origin '{}': {err}",
                config.origin
            ))
        })?;

        Ok(Self { client, endpoint })
    }

    /// The endpoint this transport posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RequestTransport for ReqwestTransport {
    async fn submit(&self, request: &ConnectionRequest) -> Result<ConnectResponse, TransportError> {
        let mut form = multipart::Form::new()
            .text("protocol", request.protocol.as_str())
            .text("hostname", request.host.clone())
            .text("port", request.port.clone())
            .text("username", request.username.clone())
            .text("password", request.password.clone());

        if let Some(key) = &request.private_key {
            form = form.part(
                "privatekey",
                multipart::Part::bytes(key.clone()).file_name("privatekey"),
            );
        }

        debug!(endpoint = %self.endpoint, "posting connection request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status));
        }

        response
            .json::<ConnectResponse>()
            .await
            .map_err(|err| TransportError::InvalidResponse(err.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_is_connect_under_the_origin() {
        let config = ClientConfig::default();
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://127.0.0.1:8886/connect");
    }

    #[test]
    fn test_endpoint_preserves_https_origin() {
        let config = ClientConfig {
            origin: Url::parse("https://gateway.example").unwrap(),
            ..ClientConfig::default()
        };
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint().as_str(),
            "https://gateway.example/connect"
        );
    }
}
