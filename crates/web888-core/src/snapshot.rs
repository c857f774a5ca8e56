// ── Produced snapshot ──
//
// What the outside world reads: the status plus fixed-size slot views and
// the pass-through settings consumers asked us to carry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{CHANNEL_SLOTS, MonitorConfig, SATELLITE_SLOTS};
use crate::model::{Channel, MacAddress, Satellite, Status};

/// The config subset that shapes a snapshot. Fixed for a monitor's life.
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    pub enable_channels: bool,
    pub enable_satellites: bool,
    pub thermal_threshold_c: f64,
    pub correlation_id: Option<String>,
    /// User-configured MAC; wins over anything discovered.
    pub mac: Option<MacAddress>,
}

impl From<&MonitorConfig> for SnapshotOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            enable_channels: config.enable_channels,
            enable_satellites: config.enable_satellites,
            thermal_threshold_c: config.thermal_threshold_c,
            correlation_id: config.correlation_id.clone(),
            mac: config
                .mac
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(MacAddress::new),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub status: Status,
    /// One entry per channel slot, idle placeholders for unused slots.
    /// `None` when channel detail is disabled or unavailable in this mode.
    pub channel_slots: Option<Vec<Channel>>,
    /// One entry per satellite slot, `None` for untracked slots.
    pub satellite_slots: Option<Vec<Option<Satellite>>>,
    pub mac_address: Option<MacAddress>,
    pub thermal_threshold_c: f64,
    pub thermal_warning: Option<bool>,
    pub correlation_id: Option<String>,
}

impl Snapshot {
    pub fn build(status: Status, options: &SnapshotOptions) -> Self {
        let channel_slots = if options.enable_channels {
            status.channels.as_deref().map(channel_slots)
        } else {
            None
        };
        let satellite_slots = if options.enable_satellites {
            status.gps.satellites.as_deref().map(satellite_slots)
        } else {
            None
        };
        let mac_address = options.mac.clone().or_else(|| {
            status
                .config
                .as_ref()
                .and_then(|c| c.mac_address.clone())
        });

        Self {
            taken_at: Utc::now(),
            thermal_warning: status.thermal_warning(options.thermal_threshold_c),
            channel_slots,
            satellite_slots,
            mac_address,
            thermal_threshold_c: options.thermal_threshold_c,
            correlation_id: options.correlation_id.clone(),
            status,
        }
    }
}

/// Place channels by index into exactly `CHANNEL_SLOTS` slots.
fn channel_slots(channels: &[Channel]) -> Vec<Channel> {
    let mut slots: Vec<Channel> = (0..CHANNEL_SLOTS)
        .map(|i| Channel::idle(u32::try_from(i).unwrap_or(u32::MAX)))
        .collect();
    for channel in channels {
        let slot = usize::try_from(channel.index)
            .ok()
            .and_then(|i| slots.get_mut(i));
        match slot {
            Some(slot) => *slot = channel.clone(),
            None => debug!(index = channel.index, "channel index outside slot range"),
        }
    }
    slots
}

/// First `SATELLITE_SLOTS` tracked satellites, padded with `None`.
fn satellite_slots(satellites: &[Satellite]) -> Vec<Option<Satellite>> {
    let mut slots: Vec<Option<Satellite>> = satellites
        .iter()
        .take(SATELLITE_SLOTS)
        .cloned()
        .map(Some)
        .collect();
    slots.resize(SATELLITE_SLOTS, None);
    slots
}
