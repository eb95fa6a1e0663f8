// Perenio cloud HTTP client
//
// Owns the reqwest session, the OAuth token state, and URL construction.
// Endpoint groups (oauth, devices, cameras) are implemented as inherent
// methods in separate files to keep this module focused on transport
// mechanics and session lifecycle.

use std::sync::atomic::AtomicU64;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::auth::{Credentials, Endpoints, OAuthSettings};
use crate::devices::DiscoveryPath;
use crate::error::Error;
use crate::models::UserInfo;
use crate::token::TokenState;
use crate::transport::TransportConfig;

/// Header carrying the vendor tenant identifier on every request.
pub(crate) const TENANT_HEADER: &str = "tenantId";

const BODY_PREVIEW_LEN: usize = 200;

/// Lifecycle of the client's HTTP session.
enum Session {
    Unopened,
    Open(reqwest::Client),
    Closed,
}

/// Async client for the Perenio cloud camera API.
///
/// Construct with [`PerenioClient::new`], then call [`setup`](Self::setup)
/// to open the session and authenticate. Every data call runs the refresh
/// guard first, so a long-lived client keeps its bearer token current on
/// its own. Share across tasks with `Arc<PerenioClient>`.
pub struct PerenioClient {
    credentials: Credentials,
    oauth: OAuthSettings,
    endpoints: Endpoints,
    transport: TransportConfig,
    session: RwLock<Session>,
    /// Held across the whole check-then-grant sequence so concurrent
    /// callers share one in-flight refresh.
    pub(crate) tokens: Mutex<TokenState>,
    /// Bumped after every grant attempt. A caller that sees it move while
    /// waiting for `tokens` adopts that outcome instead of granting again.
    pub(crate) grant_epoch: AtomicU64,
    pub(crate) user_info: RwLock<Option<UserInfo>>,
    pub(crate) discovery_path: RwLock<Option<DiscoveryPath>>,
}

impl PerenioClient {
    /// Create a client for the given account against the vendor's
    /// production endpoints. No network activity happens until
    /// [`setup`](Self::setup).
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(
            credentials,
            Endpoints::default(),
            OAuthSettings::default(),
            TransportConfig::default(),
        )
    }

    /// Create a client with explicit endpoints, OAuth identity, and transport.
    pub fn with_config(
        credentials: Credentials,
        endpoints: Endpoints,
        oauth: OAuthSettings,
        transport: TransportConfig,
    ) -> Self {
        Self {
            credentials,
            oauth,
            endpoints,
            transport,
            session: RwLock::new(Session::Unopened),
            tokens: Mutex::new(TokenState::default()),
            grant_epoch: AtomicU64::new(0),
            user_info: RwLock::new(None),
            discovery_path: RwLock::new(None),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn oauth(&self) -> &OAuthSettings {
        &self.oauth
    }

    /// Whether the HTTP session is currently open.
    pub fn is_open(&self) -> bool {
        matches!(
            *self.session.read().unwrap_or_else(PoisonError::into_inner),
            Session::Open(_)
        )
    }

    /// Whether a bearer token is on hand. This is the authoritative
    /// "did authentication succeed" check after [`setup`](Self::setup).
    pub async fn has_access_token(&self) -> bool {
        self.tokens.lock().await.access_token().is_some()
    }

    /// The current access token, if any.
    pub async fn access_token(&self) -> Option<SecretString> {
        self.tokens.lock().await.access_token().cloned()
    }

    /// Expiry recorded from the most recent grant.
    pub async fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.tokens.lock().await.expires_at()
    }

    /// Account profile fetched after the last successful authentication.
    pub fn user_info(&self) -> Option<UserInfo> {
        self.user_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Open the HTTP session and perform initial authentication.
    ///
    /// Only a failure to build the HTTP session is returned as an error.
    /// A rejected login is logged and swallowed: check
    /// [`has_access_token`](Self::has_access_token) afterwards.
    /// Calling `setup` again after [`close`](Self::close) starts a new session.
    pub async fn setup(&self) -> Result<(), Error> {
        self.start_session()?;
        if let Err(e) = self.authenticate().await {
            debug!(error = %e, "setup finished without an access token");
        }
        Ok(())
    }

    /// [`setup`](Self::setup), returning the login failure as well.
    pub async fn try_setup(&self) -> Result<(), Error> {
        self.start_session()?;
        self.authenticate().await
    }

    /// Release the HTTP session. Safe to call repeatedly; returns `true`
    /// only for the call that actually released a session.
    pub fn close(&self) -> bool {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*session, Session::Open(_)) {
            *session = Session::Closed;
            info!("closed Perenio session");
            true
        } else {
            debug!("close called with no open session");
            false
        }
    }

    fn start_session(&self) -> Result<reqwest::Client, Error> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if let Session::Open(http) = &*session {
            return Ok(http.clone());
        }
        let http = self.transport.build_client()?;
        debug!(timeout = ?self.transport.timeout, "opened Perenio session");
        *session = Session::Open(http.clone());
        Ok(http)
    }

    /// The open session, lazily opening one if the client was never set up.
    /// A closed client stays closed until the next [`setup`](Self::setup).
    pub(crate) fn open_session(&self) -> Result<reqwest::Client, Error> {
        let unopened = matches!(
            *self.session.read().unwrap_or_else(PoisonError::into_inner),
            Session::Unopened
        );
        if unopened {
            return self.start_session();
        }
        self.session()
    }

    /// The open session, without creating one.
    pub(crate) fn session(&self) -> Result<reqwest::Client, Error> {
        match &*self.session.read().unwrap_or_else(PoisonError::into_inner) {
            Session::Open(http) => Ok(http.clone()),
            Session::Unopened | Session::Closed => Err(Error::NotConnected),
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn api_url(&self, segments: &[&str]) -> Url {
        self.endpoints.api_url(segments)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Apply the standard authenticated header set.
    pub(crate) fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(token.expose_secret())
            .header(TENANT_HEADER, &self.oauth.tenant_id)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
    }
}

/// Reject anything other than HTTP 200, capturing a body preview.
pub(crate) async fn expect_ok(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status == StatusCode::OK {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Http {
        status: status.as_u16(),
        url,
        body: preview(&body).to_owned(),
    })
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
