// ── Integration entry configuration ──
//
// What a configured Perenio entry needs to run: the account, where the
// vendor endpoints live, and timing. Built by the CLI (or any other host)
// from its own config sources; this crate never reads files itself.

use std::time::Duration;

use perenio_api::{Credentials, Endpoints, OAuthSettings, PerenioClient, TransportConfig};
use secrecy::SecretString;

/// How often camera entities are polled when nothing else is configured.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a single Perenio account entry.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// Account email, also used as the OAuth username.
    pub email: String,
    pub password: SecretString,
    /// OAuth and API base URLs.
    pub endpoints: Endpoints,
    /// OAuth client identity sent with every grant.
    pub oauth: OAuthSettings,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Camera polling period. Zero disables polling.
    pub scan_interval: Duration,
}

impl IntegrationConfig {
    /// Entry for the given account against the production endpoints.
    pub fn new(email: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            endpoints: Endpoints::default(),
            oauth: OAuthSettings::default(),
            timeout: TransportConfig::default().timeout,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    /// Build an unopened API client for this entry.
    pub fn build_client(&self) -> PerenioClient {
        PerenioClient::with_config(
            Credentials::new(self.email.clone(), self.password.clone()),
            self.endpoints.clone(),
            self.oauth.clone(),
            TransportConfig::default().with_timeout(self.timeout),
        )
    }

    /// Title shown for a configured entry.
    pub fn entry_title(&self) -> String {
        format!("Perenio ({})", self.email)
    }
}
