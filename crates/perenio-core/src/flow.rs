// ── Credential validation ──
//
// Probe-then-discard check used before an entry is created: open a
// throwaway client, try to log in, and always close it again.

use tracing::{error, info};

use crate::config::IntegrationConfig;
use crate::error::FlowError;

/// Check that the configured account can log in.
///
/// Returns the entry title on success. The probe client is closed on
/// every path.
pub async fn validate_credentials(config: &IntegrationConfig) -> Result<String, FlowError> {
    let client = config.build_client();

    let outcome = match client.setup().await {
        Ok(()) => {
            if client.has_access_token().await {
                info!(email = %config.email, "credentials accepted");
                Ok(config.entry_title())
            } else {
                Err(FlowError::InvalidAuth)
            }
        }
        Err(e) => {
            error!(error = %e, "could not reach Perenio");
            Err(FlowError::CannotConnect(e))
        }
    };

    client.close();
    outcome
}
