//! Clap derive structures for the `web888` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use web888_core::ModePreference;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// web888 -- status monitor for Web-888 / KiwiSDR receivers
#[derive(Debug, Parser)]
#[command(
    name = "web888",
    version,
    about = "Monitor Web-888 and KiwiSDR receivers from the command line",
    long_about = "Reads receiver status over the public /status endpoint, or over the\n\
        admin WebSocket when an admin password is configured (channels, GPS,\n\
        system load, reporter identity).",
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
    /// Receiver profile to use
    #[arg(long, short = 'p', env = "WEB888_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "WEB888_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Receiver host (overrides profile)
    #[arg(long, short = 'H', env = "WEB888_HOST", global = true)]
    pub host: Option<String>,

    /// Receiver port (overrides profile)
    #[arg(long, short = 'P', env = "WEB888_PORT", global = true)]
    pub port: Option<u16>,

    /// Connection mode (overrides profile)
    #[arg(long, short = 'm', env = "WEB888_MODE", global = true)]
    pub mode: Option<ModeArg>,

    /// Environment variable holding the admin password
    #[arg(long, global = true)]
    pub password_env: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WEB888_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Connect and request timeout in seconds (overrides profile)
    #[arg(long, env = "WEB888_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// WebSocket when a password resolves, HTTP otherwise
    Auto,
    /// Public /status endpoint only
    Http,
    /// Admin WebSocket plus /status
    #[value(alias = "ws")]
    Websocket,
}

impl From<ModeArg> for ModePreference {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => Self::Auto,
            ModeArg::Http => Self::Http,
            ModeArg::Websocket => Self::WebSocket,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable detail and tables (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect once, print a status snapshot, disconnect
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Poll on an interval and print each snapshot
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Seconds to wait for the first WebSocket poll answers
    #[arg(long, default_value = "2")]
    pub settle: u64,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between updates (10-300; defaults to the profile's scan_interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display current configuration (passwords redacted)
    Show,

    /// Create or replace a profile from --host/--port/--mode/--password-env
    Init {
        /// Prompt for the admin password and store it in the system keyring
        #[arg(long)]
        store_password: bool,

        /// Overwrite an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the admin password in the system keyring
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
