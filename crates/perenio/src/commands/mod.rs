//! Command handlers. Each talks to Perenio through `perenio-core`.

mod cameras;
pub mod config_cmd;
mod media;
mod watch;

use std::time::Duration;

use perenio_core::Integration;
use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

/// Run a command that needs an account.
pub async fn dispatch(cmd: Command, resolved: Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    debug!(command = ?cmd, profile = %resolved.profile_name, "dispatching command");

    if matches!(cmd, Command::Check) {
        let title = perenio_core::validate_credentials(&resolved.integration)
            .await
            .map_err(|e| with_profile(e.into(), &resolved.profile_name))?;
        output::print_output(&format!("✓ {title}"), global.quiet);
        return Ok(());
    }

    let Resolved {
        profile_name,
        mut integration,
    } = resolved;
    if let Command::Watch {
        interval: Some(secs),
    } = cmd
    {
        integration.scan_interval = Duration::from_secs(secs);
    }

    let integration = Integration::setup_entry(integration)
        .await
        .map_err(|e| with_profile(e.into(), &profile_name))?;

    let result = match cmd {
        Command::Cameras => cameras::handle(&integration, global).await,
        Command::Snapshot { camera_id, file } => {
            media::snapshot(&integration, &camera_id, file, global).await
        }
        Command::Files { camera_id, limit } => {
            media::files(&integration, &camera_id, limit, global).await
        }
        Command::Stream { camera_id } => media::stream(&integration, &camera_id, global).await,
        Command::Watch { .. } => watch::handle(&integration, global).await,
        Command::Check | Command::Config(_) => Ok(()),
    };

    integration.unload().await;
    result
}

/// Name the real profile in auth failures.
fn with_profile(err: CliError, profile: &str) -> CliError {
    match err {
        CliError::AuthFailed { .. } => CliError::AuthFailed {
            profile: profile.to_owned(),
        },
        other => other,
    }
}
