// ── Runtime monitor configuration ──
//
// These types describe *how* to reach and poll one Web-888 receiver.
// They carry the credential and the timing policy, but never touch disk.
// The CLI builds a `MonitorConfig` (via web888-config) and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use web888_api::DEFAULT_PORT;
use web888_api::DrainConfig;

pub use crate::model::ConnectionMode;

/// Shortest allowed poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Longest allowed poll interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(300);
/// Number of receiver channels the snapshot pads to.
pub const CHANNEL_SLOTS: usize = 12;
/// Number of satellite slots the snapshot pads to.
pub const SATELLITE_SLOTS: usize = 12;

/// Requested connection mode, before a credential is known.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModePreference {
    /// WebSocket if a password is configured, otherwise HTTP.
    #[default]
    Auto,
    Http,
    #[serde(rename = "websocket")]
    #[strum(to_string = "websocket", serialize = "ws")]
    WebSocket,
}

impl ModePreference {
    pub fn resolve(self, has_password: bool) -> ConnectionMode {
        match self {
            Self::Auto if has_password => ConnectionMode::WebSocket,
            Self::Auto | Self::Http => ConnectionMode::Http,
            Self::WebSocket => ConnectionMode::WebSocket,
        }
    }
}

/// Timeouts that are not part of the admin handshake budget.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Cap on a whole connect attempt, in either mode.
    pub connect: Duration,
    /// Cap on one `/status` request.
    pub http_request: Duration,
    /// Pause between the request commands of one WebSocket poll cycle.
    pub command_pause: Duration,
    /// Keep-alive ping period while streaming.
    pub ping_interval: Duration,
    /// How long past a ping the socket may stay silent before it counts
    /// as dropped.
    pub ping_timeout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            http_request: Duration::from_secs(10),
            command_pause: Duration::from_millis(500),
            ping_interval: Duration::from_secs(20),
            ping_timeout: Duration::from_secs(10),
        }
    }
}

/// Exponential reconnect backoff: `min(base * factor^(failures-1), cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub factor: u32,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(10),
            factor: 2,
            cap: Duration::from_secs(300),
        }
    }
}

impl BackoffPolicy {
    /// Delay before the next attempt after `failures` consecutive failures.
    /// Zero when there has been no failure.
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        self.factor
            .checked_pow(failures - 1)
            .and_then(|mult| self.base.checked_mul(mult))
            .map_or(self.cap, |d| d.min(self.cap))
    }
}

/// Everything needed to monitor one receiver.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    pub mode: ModePreference,
    pub password: Option<SecretString>,
    /// User-provided MAC; overrides any discovered one in snapshots.
    pub mac: Option<String>,
    pub poll_interval: Duration,
    pub enable_channels: bool,
    pub enable_satellites: bool,
    /// Pass-through: only used to compute the snapshot's thermal warning.
    pub thermal_threshold_c: f64,
    /// Pass-through identifier for external consumers.
    pub correlation_id: Option<String>,
    pub timeouts: Timeouts,
    pub drain: DrainConfig,
    pub backoff: BackoffPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            mode: ModePreference::Auto,
            password: None,
            mac: None,
            poll_interval: Duration::from_secs(30),
            enable_channels: true,
            enable_satellites: false,
            thermal_threshold_c: 70.0,
            correlation_id: None,
            timeouts: Timeouts::default(),
            drain: DrainConfig::default(),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl MonitorConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Mode chosen for this configuration.
    pub fn connection_mode(&self) -> ConnectionMode {
        self.mode.resolve(self.password.is_some())
    }
}

/// Clamp a poll interval (in seconds) to the supported range.
pub fn clamp_poll_interval(secs: u64) -> Duration {
    Duration::from_secs(secs).clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}
