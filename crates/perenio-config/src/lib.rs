//! Shared configuration for Perenio tools.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `perenio_core::IntegrationConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use perenio_api::Endpoints;
use perenio_core::IntegrationConfig;

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "perenio";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the default.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Camera polling period in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_scan_interval() -> u64 {
    perenio_core::DEFAULT_SCAN_INTERVAL.as_secs()
}

/// A named Perenio account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account email.
    pub email: String,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override the OAuth realm base URL.
    pub oauth_url: Option<String>,

    /// Override the API base URL.
    pub api_url: Option<String>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override scan interval (seconds).
    pub scan_interval: Option<u64>,
}

impl Profile {
    /// Endpoints with any configured overrides applied.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let defaults = Endpoints::default();
        let oauth = self
            .oauth_url
            .as_deref()
            .unwrap_or_else(|| defaults.oauth_base().as_str());
        let api = self
            .api_url
            .as_deref()
            .unwrap_or_else(|| defaults.api_base().as_str());

        Endpoints::new(oauth, api).map_err(|e| ConfigError::Validation {
            field: "oauth_url/api_url".into(),
            reason: e.to_string(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "perenio", "perenio").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("perenio");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields defaults;
/// `PERENIO_`-prefixed variables override either, with `__` separating
/// nested keys (`PERENIO_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PERENIO_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, falling back to defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Resolve a profile's password without CLI flags.
///
/// Order: the profile's `password_env` variable, the system keyring,
/// then the plaintext `password` field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build an `IntegrationConfig` from a profile.
///
/// `password` overrides the profile's password chain when given; otherwise
/// [`resolve_password`] runs. A profile without an email has no credentials.
pub fn profile_to_integration_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    password: Option<SecretString>,
) -> Result<IntegrationConfig, ConfigError> {
    if profile.email.trim().is_empty() {
        return Err(ConfigError::NoCredentials {
            profile: profile_name.into(),
        });
    }

    let password = match password {
        Some(pw) => pw,
        None => resolve_password(profile, profile_name)?,
    };
    let mut config = IntegrationConfig::new(profile.email.clone(), password);
    config.endpoints = profile.endpoints()?;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.scan_interval =
        Duration::from_secs(profile.scan_interval.unwrap_or(defaults.scan_interval));
    Ok(config)
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile(email: &str) -> Profile {
        Profile {
            email: email.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join("absent.toml")).expect("defaults load");

        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.defaults.scan_interval, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/config.toml");

        let mut cfg = Config::default();
        let mut home = profile("me@example.com");
        home.password_env = Some("HOME_PW".into());
        home.scan_interval = Some(60);
        cfg.profiles.insert("home".into(), home);
        save_config_to(&cfg, &path).expect("save");

        let loaded = load_config_from(&path).expect("load");
        let home = &loaded.profiles["home"];
        assert_eq!(home.email, "me@example.com");
        assert_eq!(home.password_env.as_deref(), Some("HOME_PW"));
        assert_eq!(home.scan_interval, Some(60));
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "home"

                [defaults]
                timeout = 15

                [profiles.home]
                email = "me@example.com"
                "#,
            )?;
            jail.set_env("PERENIO_DEFAULTS__TIMEOUT", "5");

            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.timeout, 5);
            assert_eq!(cfg.profile_name(None), "home");
            assert_eq!(cfg.profile_name(Some("work")), "work");
            Ok(())
        });
    }

    #[test]
    fn password_env_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("PERENIO_TEST_PW", "from-env");
            let mut p = profile("me@example.com");
            p.password_env = Some("PERENIO_TEST_PW".into());
            p.password = Some("plaintext".into());

            let pw = resolve_password(&p, "jail-test").map_err(|e| e.to_string())?;
            assert_eq!(pw.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn translation_applies_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("PERENIO_TEST_PW", "pw");
            let mut p = profile("me@example.com");
            p.password_env = Some("PERENIO_TEST_PW".into());
            p.api_url = Some("http://localhost:9000/api/v1".into());
            p.timeout = Some(7);

            let config =
                profile_to_integration_config(&p, "jail-test", &Defaults::default(), None)
                    .map_err(|e| e.to_string())?;
            assert_eq!(config.email, "me@example.com");
            assert_eq!(config.timeout, Duration::from_secs(7));
            assert_eq!(config.scan_interval, Duration::from_secs(30));
            assert_eq!(
                config.endpoints.api_base().as_str(),
                "http://localhost:9000/api/v1/"
            );
            assert_eq!(config.endpoints.oauth_base(), Endpoints::default().oauth_base());
            Ok(())
        });
    }

    #[test]
    fn empty_email_means_no_credentials() {
        let err = profile_to_integration_config(&profile(" "), "p", &Defaults::default(), None)
            .expect_err("no email");
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "p"));
    }

    #[test]
    fn explicit_password_skips_the_chain() {
        let mut p = profile("me@example.com");
        p.password = Some("from-file".into());

        let config = profile_to_integration_config(
            &p,
            "explicit",
            &Defaults::default(),
            Some(SecretString::from("from-flag")),
        )
        .expect("config");
        assert_eq!(config.password.expose_secret(), "from-flag");
    }

    #[test]
    fn bad_endpoint_url_is_rejected() {
        let mut p = profile("me@example.com");
        p.oauth_url = Some("not a url".into());
        assert!(matches!(p.endpoints(), Err(ConfigError::Validation { .. })));
    }
}
