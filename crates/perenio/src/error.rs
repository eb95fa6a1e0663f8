//! CLI error types with miette diagnostics.
//!
//! Maps core, config, and API errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use perenio_config::ConfigError;
use perenio_core::{CoreError, FlowError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach Perenio")]
    #[diagnostic(
        code(perenio::connection_failed),
        help("Check your network connection and try again with -vv for request logs.")
    )]
    ConnectionFailed {
        #[source]
        source: perenio_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(perenio::auth_failed),
        help(
            "Verify the email and password for profile '{profile}'.\n\
             Run: perenio --profile {profile} config set-password"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(perenio::no_credentials),
        help(
            "Add the profile to {path}, or pass --email and --password\n\
             (PERENIO_EMAIL / PERENIO_PASSWORD)."
        )
    )]
    NoCredentials { profile: String, path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} for camera '{camera_id}' is unavailable")]
    #[diagnostic(
        code(perenio::unavailable),
        help("Run: perenio cameras to see available cameras")
    )]
    Unavailable {
        resource: &'static str,
        camera_id: String,
        #[source]
        source: Option<perenio_api::Error>,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {0}")]
    #[diagnostic(code(perenio::api_error))]
    Api(#[source] perenio_api::Error),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(perenio::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(perenio::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(perenio::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Unavailable { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Api(e) if e.is_auth_expired() => exit_code::AUTH,
            Self::Api(e) if e.is_transient() => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<perenio_api::Error> for CliError {
    fn from(err: perenio_api::Error) -> Self {
        match err {
            perenio_api::Error::Transport(_) | perenio_api::Error::NotConnected => {
                Self::ConnectionFailed { source: err }
            }
            perenio_api::Error::SnapshotUnavailable { ref camera_id } => Self::Unavailable {
                resource: "snapshot",
                camera_id: camera_id.clone(),
                source: Some(err),
            },
            other => Self::Api(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotReady { source, .. } => match source {
                Some(e) if !e.is_auth_expired() => e.into(),
                _ => Self::AuthFailed {
                    profile: "current".into(),
                },
            },
            CoreError::Api(e) => e.into(),
            CoreError::CameraNotFound { camera_id } => Self::Unavailable {
                resource: "camera",
                camera_id,
                source: None,
            },
        }
    }
}

impl From<FlowError> for CliError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::InvalidAuth => Self::AuthFailed {
                profile: "current".into(),
            },
            FlowError::CannotConnect(source) => Self::ConnectionFailed { source },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials {
                profile,
                path: perenio_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}
