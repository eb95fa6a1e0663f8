// ── Core error types ──
//
// Errors a host sees when setting up or validating an entry. Most API
// failures never reach this far: the client's plain-form calls log them
// and hand back empty results.

use thiserror::Error;

/// Errors from the integration lifecycle.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entry cannot start yet. Hosts should retry setup later.
    #[error("Perenio is not ready: {reason}")]
    NotReady {
        reason: String,
        #[source]
        source: Option<perenio_api::Error>,
    },

    #[error("Camera not found: {camera_id}")]
    CameraNotFound { camera_id: String },

    #[error(transparent)]
    Api(#[from] perenio_api::Error),
}

impl CoreError {
    /// Whether the underlying failure was a rejected login.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::NotReady { source: None, .. } => true,
            Self::NotReady {
                source: Some(e), ..
            }
            | Self::Api(e) => e.is_auth_expired(),
            Self::CameraNotFound { .. } => false,
        }
    }
}

/// Outcome of validating credentials before an entry is created.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The session opened but no token was granted.
    #[error("Invalid email or password")]
    InvalidAuth,

    /// The session could not be set up at all.
    #[error("Cannot connect to Perenio: {0}")]
    CannotConnect(#[source] perenio_api::Error),
}

impl FlowError {
    /// Stable key for form error display.
    pub fn key(&self) -> &'static str {
        match self {
            Self::InvalidAuth => "invalid_auth",
            Self::CannotConnect(_) => "cannot_connect",
        }
    }
}
