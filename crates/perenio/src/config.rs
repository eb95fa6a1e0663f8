//! CLI configuration: thin wrapper around `perenio_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--email, --password, --timeout, endpoint URLs).

use secrecy::SecretString;

use perenio_config::profile_to_integration_config;
use perenio_core::IntegrationConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use perenio_config::{
    Config, config_path, load_config_or_default, save_config, store_password,
};

/// An integration config together with the profile it came from.
pub struct Resolved {
    pub profile_name: String,
    pub integration: IntegrationConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build the integration config for the active profile.
///
/// Flags win over profile values. Without a matching profile, `--email`
/// and `--password` alone are enough.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();
    if let Some(ref email) = global.email {
        profile.email.clone_from(email);
    }
    profile.oauth_url = global.oauth_url.clone().or(profile.oauth_url);
    profile.api_url = global.api_url.clone().or(profile.api_url);
    profile.timeout = global.timeout.or(profile.timeout);

    let password = global.password.clone().map(SecretString::from);
    let integration =
        profile_to_integration_config(&profile, &profile_name, &cfg.defaults, password)?;

    Ok(Resolved {
        profile_name,
        integration,
    })
}
