// ── Receiver channels ──

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// What is occupying a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Idle,
    /// FT8 or FT4 decoder.
    Ft8,
    Wspr,
    /// A client on the device itself without an extension tag.
    Local,
    User,
    /// Any other extension, by lower-cased name.
    Extension(String),
}

impl ChannelKind {
    /// Classify from the client address and extension tag.
    ///
    /// No address means idle; the extension decides next; a loopback
    /// address with no extension is local; everything else is a user.
    pub fn classify(client_address: &str, extension: &str) -> Self {
        if client_address.trim().is_empty() {
            return Self::Idle;
        }
        let ext = extension.trim().to_lowercase();
        match ext.as_str() {
            "ft8" | "ft4" => Self::Ft8,
            "wspr" => Self::Wspr,
            "" if is_loopback(client_address) => Self::Local,
            "" => Self::User,
            _ => Self::Extension(ext),
        }
    }

    pub fn is_automated(&self) -> bool {
        matches!(self, Self::Ft8 | Self::Wspr | Self::Extension(_))
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Ft8 => f.write_str("ft8"),
            Self::Wspr => f.write_str("wspr"),
            Self::Local => f.write_str("local"),
            Self::User => f.write_str("user"),
            Self::Extension(name) => f.write_str(name),
        }
    }
}

fn is_loopback(address: &str) -> bool {
    address
        .trim()
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.to_canonical().is_loopback())
}

/// Decoder activity parsed from a channel's status string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelActivity {
    pub decoded_count: u64,
    pub preemptible: bool,
}

impl ChannelActivity {
    /// Parse an already percent-decoded status string such as
    /// `1042 decoded, preemptible`. Never fails.
    pub fn parse(status: &str) -> Self {
        let mut tokens = status.split_whitespace();
        let decoded_count = match (tokens.next(), tokens.next()) {
            (Some(count), Some(word))
                if word.trim_end_matches(|c: char| !c.is_alphanumeric()) == "decoded" =>
            {
                count.parse().unwrap_or(0)
            }
            _ => 0,
        };
        Self {
            decoded_count,
            preemptible: status.to_lowercase().contains("preemptible"),
        }
    }
}

/// One receiver demodulation slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub index: u32,
    pub name: String,
    pub frequency_hz: u64,
    /// Demodulation mode (`usb`, `am`, ...).
    pub mode: String,
    /// Empty when the channel is free.
    pub client_address: String,
    /// Extension tag; empty for a plain listener.
    pub extension: String,
    pub decoded_count: u64,
    /// `HHH:MM:SS`
    pub session_time: String,
    pub preemptible: bool,
}

impl Channel {
    pub fn kind(&self) -> ChannelKind {
        ChannelKind::classify(&self.client_address, &self.extension)
    }

    pub fn is_active(&self) -> bool {
        !self.client_address.trim().is_empty()
    }

    /// Extension or on-device client rather than a remote listener.
    pub fn is_automated(&self) -> bool {
        !self.extension.is_empty() || is_loopback(&self.client_address)
    }

    /// `session_time` in seconds; 0 when it is not `H:MM:SS`.
    pub fn session_seconds(&self) -> u64 {
        let parts: Vec<&str> = self.session_time.trim().split(':').collect();
        let [h, m, s] = parts.as_slice() else {
            return 0;
        };
        match (h.parse::<u64>(), m.parse::<u64>(), s.parse::<u64>()) {
            (Ok(h), Ok(m), Ok(s)) => h
                .checked_mul(3600)
                .and_then(|t| t.checked_add(m.checked_mul(60)?))
                .and_then(|t| t.checked_add(s))
                .unwrap_or(0),
            _ => 0,
        }
    }

    pub fn frequency_khz(&self) -> f64 {
        lossy_f64(self.frequency_hz) / 1_000.0
    }

    pub fn frequency_mhz(&self) -> f64 {
        lossy_f64(self.frequency_hz) / 1_000_000.0
    }

    /// Placeholder for an unoccupied slot.
    pub fn idle(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn lossy_f64(n: u64) -> f64 {
    n as f64
}

/// Aggregates over the current channel list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub active: usize,
    pub idle: usize,
    pub users: usize,
    pub local: usize,
    pub ft8: usize,
    pub wspr: usize,
    pub other_extensions: usize,
    pub preemptible: usize,
    pub total_decodes: u64,
    pub ft8_decodes: u64,
    pub wspr_decodes: u64,
    pub session_hours: f64,
}

impl ChannelSummary {
    pub fn from_channels(channels: &[Channel]) -> Self {
        let mut summary = Self::default();
        let mut session_seconds = 0_u64;

        for channel in channels {
            match channel.kind() {
                ChannelKind::Idle => summary.idle += 1,
                ChannelKind::Ft8 => {
                    summary.ft8 += 1;
                    summary.ft8_decodes =
                        summary.ft8_decodes.saturating_add(channel.decoded_count);
                }
                ChannelKind::Wspr => {
                    summary.wspr += 1;
                    summary.wspr_decodes =
                        summary.wspr_decodes.saturating_add(channel.decoded_count);
                }
                ChannelKind::Local => summary.local += 1,
                ChannelKind::User => summary.users += 1,
                ChannelKind::Extension(_) => summary.other_extensions += 1,
            }
            if channel.is_active() {
                summary.active += 1;
            }
            if channel.preemptible {
                summary.preemptible += 1;
            }
            summary.total_decodes = summary.total_decodes.saturating_add(channel.decoded_count);
            session_seconds = session_seconds.saturating_add(channel.session_seconds());
        }

        summary.session_hours = lossy_f64(session_seconds) / 3600.0;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(address: &str, extension: &str) -> Channel {
        Channel {
            client_address: address.into(),
            extension: extension.into(),
            ..Channel::default()
        }
    }

    #[test]
    fn classification() {
        assert_eq!(channel("203.0.113.9", "").kind(), ChannelKind::User);
        assert_eq!(channel("127.0.0.1", "").kind(), ChannelKind::Local);
        assert_eq!(channel("127.0.0.1", "ft4").kind(), ChannelKind::Ft8);
        assert_eq!(channel("127.0.0.1", "FT8").kind(), ChannelKind::Ft8);
        assert_eq!(channel("127.0.0.1", "wspr").kind(), ChannelKind::Wspr);
        assert_eq!(
            channel("127.0.0.1", "DRM").kind(),
            ChannelKind::Extension("drm".into())
        );
        assert_eq!(channel("", "wspr").kind(), ChannelKind::Idle);
        assert_eq!(channel("::1", "").kind(), ChannelKind::Local);
        assert_eq!(channel("::ffff:127.0.0.1", "").kind(), ChannelKind::Local);
    }

    #[test]
    fn kind_display() {
        assert_eq!(ChannelKind::Ft8.to_string(), "ft8");
        assert_eq!(ChannelKind::Extension("drm".into()).to_string(), "drm");
    }

    #[test]
    fn activity_with_count_and_preemptible() {
        let a = ChannelActivity::parse("1042 decoded, preemptible");
        assert_eq!(a.decoded_count, 1042);
        assert!(a.preemptible);
    }

    #[test]
    fn activity_without_leading_integer() {
        assert_eq!(ChannelActivity::parse("decoded"), ChannelActivity::default());
        assert_eq!(ChannelActivity::parse(""), ChannelActivity::default());
        assert_eq!(ChannelActivity::parse("abc decoded").decoded_count, 0);
    }

    #[test]
    fn activity_requires_decoded_word() {
        let a = ChannelActivity::parse("12 spots");
        assert_eq!(a.decoded_count, 0);
        assert!(!a.preemptible);
        assert_eq!(ChannelActivity::parse("7 decoded").decoded_count, 7);
    }

    #[test]
    fn session_time_to_seconds() {
        let ch = Channel {
            session_time: "518:00:56".into(),
            ..Channel::default()
        };
        assert_eq!(ch.session_seconds(), 518 * 3600 + 56);
        let bad = Channel {
            session_time: "00:56".into(),
            ..Channel::default()
        };
        assert_eq!(bad.session_seconds(), 0);
        let huge = Channel {
            session_time: "9999999999999999:00:00".into(),
            ..Channel::default()
        };
        assert_eq!(huge.session_seconds(), 0);
    }

    #[test]
    fn summary_saturates_instead_of_overflowing() {
        let mut a = channel("127.0.0.1", "ft8");
        a.decoded_count = u64::MAX;
        a.session_time = "5124095576030431:00:00".into();
        let mut b = channel("127.0.0.1", "ft8");
        b.decoded_count = 10;
        b.session_time = "5124095576030431:00:00".into();

        let s = ChannelSummary::from_channels(&[a, b]);
        assert_eq!(s.total_decodes, u64::MAX);
        assert_eq!(s.ft8_decodes, u64::MAX);
        assert!(s.session_hours > 0.0);
    }

    #[test]
    fn frequency_views() {
        let ch = Channel {
            frequency_hz: 14_074_000,
            ..Channel::default()
        };
        assert!((ch.frequency_khz() - 14_074.0).abs() < 1e-9);
        assert!((ch.frequency_mhz() - 14.074).abs() < 1e-9);
    }

    #[test]
    fn summary_counts() {
        let mut ft8 = channel("127.0.0.1", "ft8");
        ft8.decoded_count = 100;
        ft8.session_time = "1:00:00".into();
        let mut wspr = channel("127.0.0.1", "wspr");
        wspr.decoded_count = 5;
        wspr.preemptible = true;
        let channels = vec![ft8, wspr, channel("198.51.100.7", ""), Channel::idle(3)];

        let s = ChannelSummary::from_channels(&channels);

        assert_eq!(s.active, 3);
        assert_eq!(s.idle, 1);
        assert_eq!(s.users, 1);
        assert_eq!(s.ft8, 1);
        assert_eq!(s.wspr, 1);
        assert_eq!(s.preemptible, 1);
        assert_eq!(s.total_decodes, 105);
        assert_eq!(s.ft8_decodes, 100);
        assert_eq!(s.wspr_decodes, 5);
        assert!((s.session_hours - 1.0).abs() < 1e-9);
    }
}
