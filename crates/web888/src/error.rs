//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a distinct exit code per failure class.

use miette::Diagnostic;
use thiserror::Error;

use web888_config::ConfigError;
use web888_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFIG: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Web-888 at {address}")]
    #[diagnostic(
        code(web888::connection_failed),
        help(
            "Check that the receiver is powered and reachable, and that the port is right.\n\
             {reason}"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Web-888 at {address} disconnected")]
    #[diagnostic(code(web888::disconnected))]
    Disconnected { address: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(web888::auth_failed),
        help(
            "The receiver rejected the admin password.\n\
             Run: web888 config set-password --profile {profile}\n\
             Or drop the password and use --mode http for public status only."
        )
    )]
    AuthFailed { profile: String, message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(web888::timeout),
        help("Increase the timeout with --timeout or check the receiver's load.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(web888::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(web888::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: web888 config init --profile {name} --host <HOST>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No receiver configured")]
    #[diagnostic(
        code(web888::no_config),
        help(
            "Pass --host, or create a profile with: web888 config init --host <HOST>\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(web888::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(web888::io))]
    Io(#[from] std::io::Error),

    #[error("failed to render output: {0}")]
    #[diagnostic(code(web888::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(web888::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } | Self::Config(_) => {
                exit_code::CONFIG
            }
            Self::Io(_) | Self::Render(_) | Self::Internal(_) => exit_code::GENERAL,
        }
    }

    /// Attach the receiver address and profile the core error lacks.
    pub fn from_core(err: CoreError, address: &str, profile: &str) -> Self {
        match err {
            CoreError::ConnectionFailed { address: at, reason } => Self::ConnectionFailed {
                address: if at.is_empty() { address.into() } else { at },
                reason,
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            CoreError::Disconnected => Self::Disconnected {
                address: address.into(),
            },
            other => other.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { address, reason } => {
                CliError::ConnectionFailed { address, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },
            CoreError::Disconnected => CliError::Disconnected {
                address: "(unknown)".into(),
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other),
        }
    }
}
