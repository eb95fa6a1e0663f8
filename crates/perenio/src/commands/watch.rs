//! `perenio watch`

use perenio_core::Integration;
use tracing::info;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Discover cameras and keep them polled until Ctrl-C.
pub async fn handle(integration: &Integration, global: &GlobalOpts) -> Result<(), CliError> {
    let cameras = integration.discover_cameras().await;
    let period = integration.config().scan_interval;

    integration.spawn_polling().await;
    output::status(
        &format!(
            "Watching {} camera(s) every {}s. Press Ctrl-C to stop.",
            cameras.len(),
            period.as_secs()
        ),
        global.quiet,
    );

    tokio::signal::ctrl_c().await?;
    info!("interrupted, stopping");
    Ok(())
}
