// Transport configuration for building the client's reqwest session.
//
// Every request inherits the timeouts configured here, so a stalled
// vendor endpoint surfaces as `Error::Transport` instead of hanging
// the caller indefinitely.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("perenio-api/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total per-request timeout (connect + headers + body).
    pub timeout: Duration,
    /// Upper bound on establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Config with a custom total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout.min(self.timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}
