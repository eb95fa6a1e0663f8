use thiserror::Error;

/// Top-level error type for the `perenio-api` crate.
///
/// Covers every failure mode of the cloud client: authentication,
/// transport, HTTP status, payload shape, and session lifecycle.
/// `perenio-core` maps these into host-facing conditions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token endpoint rejected the grant (wrong credentials, revoked refresh token, ...).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// An authenticated call was attempted with no access token on hand.
    #[error("Not authenticated -- no access token available")]
    NotAuthenticated,

    // ── Session ─────────────────────────────────────────────────────
    /// The HTTP session has not been opened, or was released by `close()`.
    #[error("HTTP session is not open")]
    NotConnected,

    /// Building the underlying `reqwest::Client` failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status from a vendor endpoint.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Probing ─────────────────────────────────────────────────────
    /// No candidate discovery path answered with HTTP 200.
    #[error("No device discovery endpoint is reachable")]
    NoDiscoveryEndpoint,

    /// Neither the snapshot command nor any direct snapshot URL produced an image.
    #[error("No snapshot available for camera {camera_id}")]
    SnapshotUnavailable { camera_id: String },
}

impl Error {
    /// Returns `true` if the vendor rejected our credentials or token
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::NotAuthenticated | Self::Http { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> Error {
        Error::Http {
            status,
            url: "https://iot.example/api/v1/cameras".into(),
            body: String::new(),
        }
    }

    #[test]
    fn not_found_only_for_404() {
        assert!(http(404).is_not_found());
        assert!(!http(403).is_not_found());
        assert!(!Error::NoDiscoveryEndpoint.is_not_found());
    }

    #[test]
    fn unauthorized_status_counts_as_expired_auth() {
        assert!(http(401).is_auth_expired());
        assert!(Error::NotAuthenticated.is_auth_expired());
        assert!(!http(500).is_auth_expired());
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(http(503).is_transient());
        assert!(http(429).is_transient());
        assert!(!http(400).is_transient());
    }
}
