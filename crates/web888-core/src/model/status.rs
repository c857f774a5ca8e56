// ── Aggregate status ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::channel::{Channel, ChannelSummary};
use super::device_config::DeviceConfig;
use super::gps::{GpsReceiver, GpsStatus};
use super::reporter::ReporterConfig;
use super::system::SystemStats;

/// Active connection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConnectionMode {
    /// Plain `/status` polling only.
    Http,
    /// Admin WebSocket plus the hybrid `/status` fetch.
    #[serde(rename = "websocket")]
    #[strum(to_string = "websocket", serialize = "ws")]
    WebSocket,
}

impl ConnectionMode {
    pub fn is_websocket(self) -> bool {
        matches!(self, Self::WebSocket)
    }
}

/// The `snr` status pair (`all,hf`), positive readings only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnrReading {
    pub all: Option<u32>,
    pub hf: Option<u32>,
}

impl SnrReading {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(',').map(|p| p.trim().parse::<i64>().ok());
        let positive = |v: Option<Option<i64>>| {
            v.flatten()
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
        };
        Self {
            all: positive(parts.next()),
            hf: positive(parts.next()),
        }
    }
}

/// Everything known about one receiver.
///
/// HTTP-surface fields are `Option` because a device may omit any line.
/// WebSocket-only sub-structs are `None` whenever `mode` is `Http`; in
/// WebSocket mode they start as `Some(default)` and are filled in by
/// successive messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub connected: bool,
    pub mode: ConnectionMode,
    pub last_update: Option<DateTime<Utc>>,

    // ── /status fields ──
    pub name: Option<String>,
    pub location: Option<String>,
    pub sw_version: Option<String>,
    pub antenna: Option<String>,
    pub bands: Option<String>,
    pub uptime_seconds: Option<u64>,
    pub users: Option<u32>,
    pub users_max: Option<u32>,
    /// Access state (`active`, `private`, ...).
    pub access: Option<String>,
    pub offline: Option<bool>,
    pub operator_email: Option<String>,
    pub antenna_connected: Option<bool>,
    pub adc_overflow: Option<u64>,
    /// Raw `all,hf` pair; see [`Status::snr`].
    pub snr: Option<String>,
    pub hardware: Option<String>,
    pub freq_offset_hz: Option<f64>,

    pub gps: GpsStatus,

    // ── WebSocket only ──
    pub system: Option<SystemStats>,
    pub channels: Option<Vec<Channel>>,
    pub reporter: Option<ReporterConfig>,
    pub config: Option<DeviceConfig>,
}

impl Status {
    pub fn new(mode: ConnectionMode) -> Self {
        let ws = mode.is_websocket();
        Self {
            connected: false,
            mode,
            last_update: None,
            name: None,
            location: None,
            sw_version: None,
            antenna: None,
            bands: None,
            uptime_seconds: None,
            users: None,
            users_max: None,
            access: None,
            offline: None,
            operator_email: None,
            antenna_connected: None,
            adc_overflow: None,
            snr: None,
            hardware: None,
            freq_offset_hz: None,
            gps: GpsStatus {
                receiver: ws.then(GpsReceiver::default),
                satellites: ws.then(Vec::new),
                ..GpsStatus::default()
            },
            system: ws.then(SystemStats::default),
            channels: ws.then(Vec::new),
            reporter: ws.then(ReporterConfig::default),
            config: ws.then(DeviceConfig::default),
        }
    }

    /// Switch modes, keeping the `/status` fields. WebSocket-only sections
    /// are reset: dropped for HTTP, started empty for WebSocket.
    pub fn set_mode(&mut self, mode: ConnectionMode) {
        if self.mode == mode {
            return;
        }
        let fresh = Self::new(mode);
        self.mode = mode;
        self.gps.receiver = fresh.gps.receiver;
        self.gps.satellites = fresh.gps.satellites;
        self.system = fresh.system;
        self.channels = fresh.channels;
        self.reporter = fresh.reporter;
        self.config = fresh.config;
    }

    /// `H:MM:SS`, hours unbounded.
    pub fn uptime_formatted(&self) -> Option<String> {
        self.uptime_seconds.map(|secs| {
            format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
        })
    }

    pub fn snr(&self) -> SnrReading {
        self.snr.as_deref().map(SnrReading::parse).unwrap_or_default()
    }

    pub fn snr_all(&self) -> Option<u32> {
        self.snr().all
    }

    pub fn snr_hf(&self) -> Option<u32> {
        self.snr().hf
    }

    pub fn channel_summary(&self) -> Option<ChannelSummary> {
        self.channels.as_deref().map(ChannelSummary::from_channels)
    }

    pub fn cpu_temp_c(&self) -> Option<f64> {
        self.system.as_ref().map(|s| s.cpu_temp_c)
    }

    /// `None` outside WebSocket mode.
    pub fn thermal_warning(&self, threshold_c: f64) -> Option<bool> {
        self.system.as_ref().map(|s| s.is_overheating(threshold_c))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn http_mode_reports_websocket_fields_as_absent() {
        let status = Status::new(ConnectionMode::Http);
        assert_eq!(status.cpu_temp_c(), None);
        assert_eq!(status.gps.satellites, None);
        assert_eq!(status.gps.receiver, None);
        assert_eq!(status.reporter, None);
        assert_eq!(status.config, None);
        assert_eq!(status.channel_summary(), None);
        assert_eq!(status.thermal_warning(70.0), None);
    }

    #[test]
    fn websocket_mode_starts_with_empty_sections() {
        let status = Status::new(ConnectionMode::WebSocket);
        assert_eq!(status.cpu_temp_c(), Some(0.0));
        assert_eq!(status.gps.satellites, Some(Vec::new()));
        assert!(status.reporter.is_some());
        assert_eq!(status.thermal_warning(70.0), Some(false));
    }

    #[test]
    fn mode_switch_keeps_http_fields() {
        let mut status = Status::new(ConnectionMode::WebSocket);
        status.name = Some("Rx".into());
        status.system.as_mut().unwrap().cpu_temp_c = 61.0;

        status.set_mode(ConnectionMode::Http);
        assert_eq!(status.name.as_deref(), Some("Rx"));
        assert_eq!(status.system, None);

        status.set_mode(ConnectionMode::WebSocket);
        assert_eq!(status.cpu_temp_c(), Some(0.0));
    }

    #[test]
    fn uptime_format() {
        let mut status = Status::new(ConnectionMode::Http);
        assert_eq!(status.uptime_formatted(), None);
        status.uptime_seconds = Some(90_061);
        assert_eq!(status.uptime_formatted().as_deref(), Some("25:01:01"));
        status.uptime_seconds = Some(59);
        assert_eq!(status.uptime_formatted().as_deref(), Some("0:00:59"));
    }

    #[test]
    fn snr_pair_keeps_positive_values_only() {
        assert_eq!(
            SnrReading::parse("21,0"),
            SnrReading {
                all: Some(21),
                hf: None
            }
        );
        assert_eq!(SnrReading::parse("-3, 18").hf, Some(18));
        assert_eq!(SnrReading::parse("junk"), SnrReading::default());

        let mut status = Status::new(ConnectionMode::Http);
        status.snr = Some("24,19".into());
        assert_eq!(status.snr_all(), Some(24));
        assert_eq!(status.snr_hf(), Some(19));
    }

    #[test]
    fn mode_names() {
        assert_eq!(ConnectionMode::WebSocket.to_string(), "websocket");
        assert_eq!("http".parse::<ConnectionMode>().unwrap(), ConnectionMode::Http);
        assert_eq!(
            serde_json::to_string(&ConnectionMode::WebSocket).unwrap(),
            "\"websocket\""
        );
    }
}
