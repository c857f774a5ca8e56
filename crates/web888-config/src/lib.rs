//! Shared configuration for Web-888 monitor tools.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `web888_core::MonitorConfig`. The core crate never reads
//! files; everything on disk is handled here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use web888_core::{ModePreference, MonitorConfig, Timeouts, clamp_poll_interval};

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "web888";

/// Environment variable consulted after a profile's `password_env`.
pub const PASSWORD_ENV: &str = "WEB888_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

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
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named receiver profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile name to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }

    /// Comma-separated profile names, or `(none)`.
    pub fn profile_names(&self) -> String {
        if self.profiles.is_empty() {
            "(none)".into()
        } else {
            self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// A named receiver profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Receiver hostname or IP address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `auto`, `http`, or `websocket`.
    #[serde(default)]
    pub mode: ModePreference,

    /// Admin password (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the admin password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// MAC address reported instead of any discovered one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,

    /// Poll interval in seconds, clamped to 10..=300.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    #[serde(default = "default_true")]
    pub enable_channels: bool,

    #[serde(default)]
    pub enable_satellites: bool,

    /// CPU temperature warning threshold, °C.
    #[serde(default = "default_thermal_threshold")]
    pub thermal_threshold: f64,

    /// Opaque identifier passed through to snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Connect timeout override, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            mode: ModePreference::Auto,
            password: None,
            password_env: None,
            mac: None,
            scan_interval: default_scan_interval(),
            enable_channels: true,
            enable_satellites: false,
            thermal_threshold: default_thermal_threshold(),
            correlation_id: None,
            timeout: None,
        }
    }
}

fn default_port() -> u16 {
    web888_core::DEFAULT_PORT
}
fn default_scan_interval() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_thermal_threshold() -> f64 {
    70.0
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "web888", "web888").map_or_else(
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
    p.push("web888");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path, merged under defaults and over
/// `WEB888_`-prefixed environment variables (`__` separates nesting,
/// e.g. `WEB888_PROFILES__SHACK__HOST`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WEB888_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
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

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

fn keyring_lookup(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Resolve the admin password from the credential chain. `None` means no
/// password anywhere, which under `auto` mode selects HTTP.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_lookup,
    )
}

/// [`resolve_password`] with the environment and keyring lookups supplied.
///
/// Order: profile `password_env` → `WEB888_PASSWORD` → keyring →
/// plaintext profile value. Empty values are skipped.
pub fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    let from_env = profile
        .password_env
        .as_deref()
        .and_then(&env)
        .filter(|v| !v.is_empty());
    from_env
        .or_else(|| env(PASSWORD_ENV).filter(|v| !v.is_empty()))
        .or_else(|| keyring(profile_name).filter(|v| !v.is_empty()))
        .or_else(|| profile.password.clone().filter(|v| !v.is_empty()))
        .map(SecretString::from)
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Check a profile's values before they reach the monitor.
pub fn validate_profile(profile: &Profile) -> Result<(), ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be between 1 and 65535".into(),
        });
    }
    if !profile.thermal_threshold.is_finite() {
        return Err(ConfigError::Validation {
            field: "thermal_threshold".into(),
            reason: format!("expected a temperature, got {}", profile.thermal_threshold),
        });
    }
    if profile.timeout == Some(0) {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(())
}

/// Build a `MonitorConfig` from a profile, resolving its password.
pub fn profile_to_monitor_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<MonitorConfig, ConfigError> {
    let password = resolve_password(profile, profile_name);
    build_monitor_config(profile, password)
}

/// Build a `MonitorConfig` from a profile and an already-resolved password.
pub fn build_monitor_config(
    profile: &Profile,
    password: Option<SecretString>,
) -> Result<MonitorConfig, ConfigError> {
    validate_profile(profile)?;

    let mut timeouts = Timeouts::default();
    if let Some(secs) = profile.timeout {
        timeouts.connect = Duration::from_secs(secs);
        timeouts.http_request = Duration::from_secs(secs);
    }

    let mut config = MonitorConfig::new(profile.host.trim(), profile.port);
    config.mode = profile.mode;
    config.password = password;
    config.mac = profile.mac.clone().filter(|m| !m.trim().is_empty());
    config.poll_interval = clamp_poll_interval(profile.scan_interval);
    config.enable_channels = profile.enable_channels;
    config.enable_satellites = profile.enable_satellites;
    config.thermal_threshold_c = profile.thermal_threshold;
    config.correlation_id = profile.correlation_id.clone();
    config.timeouts = timeouts;
    Ok(config)
}
