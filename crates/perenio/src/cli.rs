//! Clap derive structures for the `perenio` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use perenio_api::DEFAULT_FILE_LIMIT;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// perenio -- inspect Perenio cloud cameras from the command line
#[derive(Debug, Parser)]
#[command(
    name = "perenio",
    version,
    about = "Inspect Perenio cloud cameras from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "PERENIO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account email (overrides profile)
    #[arg(long, short = 'e', env = "PERENIO_EMAIL", global = true)]
    pub email: Option<String>,

    /// Account password (overrides profile, keyring, and password_env)
    #[arg(long, env = "PERENIO_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// OAuth realm base URL
    #[arg(long, env = "PERENIO_OAUTH_URL", global = true, hide = true)]
    pub oauth_url: Option<String>,

    /// API base URL
    #[arg(long, env = "PERENIO_API_URL", global = true, hide = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PERENIO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PERENIO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify that the account can log in
    Check,

    /// List cameras on the account
    #[command(alias = "cams", alias = "ls")]
    Cameras,

    /// Save a still image from a camera
    Snapshot {
        /// Camera identifier
        camera_id: String,

        /// Output file (default: <camera_id>.jpg, "-" for stdout)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// List recorded video files for a camera, newest first
    Files {
        /// Camera identifier
        camera_id: String,

        /// Maximum number of files
        #[arg(long, short = 'l', default_value_t = DEFAULT_FILE_LIMIT)]
        limit: u32,
    },

    /// Request a media-stream offer for a camera
    Stream {
        /// Camera identifier
        camera_id: String,
    },

    /// Keep cameras polled until interrupted
    Watch {
        /// Polling interval in seconds (overrides profile)
        #[arg(long, short = 'i')]
        interval: Option<u64>,
    },

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current configuration with secrets masked
    Show,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}
