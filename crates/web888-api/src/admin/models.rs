// Wire models for admin WebSocket payloads.
//
// Field names follow the device's compact keys via `#[serde(rename)]`.
// Everything is optional: a key that is missing or malformed stays `None`
// and the merge layer leaves the corresponding status field untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

// ── user_cb ──────────────────────────────────────────────────────────

/// One receiver channel from `user_cb`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(rename = "i", default, deserialize_with = "lenient::int")]
    pub index: Option<u32>,
    /// Percent-decoded by the frame parser.
    #[serde(rename = "n", default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(rename = "f", default, deserialize_with = "lenient::int")]
    pub frequency_hz: Option<u64>,
    #[serde(rename = "m", default, deserialize_with = "lenient::text")]
    pub mode: Option<String>,
    #[serde(rename = "e", default, deserialize_with = "lenient::text")]
    pub extension: Option<String>,
    /// Activity string, e.g. `1042 decoded, preemptible` (percent-decoded).
    #[serde(rename = "g", default, deserialize_with = "lenient::text")]
    pub activity: Option<String>,
    #[serde(rename = "a", default, deserialize_with = "lenient::text")]
    pub client_address: Option<String>,
    /// `HHH:MM:SS`
    #[serde(rename = "t", default, deserialize_with = "lenient::text")]
    pub session_time: Option<String>,
}

// ── stats_cb ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsBlock {
    #[serde(rename = "ct", default, deserialize_with = "lenient::int")]
    pub uptime_seconds: Option<u64>,
    #[serde(rename = "cc", default, deserialize_with = "lenient::float")]
    pub cpu_temp_c: Option<f64>,
    #[serde(rename = "cf", default, deserialize_with = "lenient::float")]
    pub cpu_freq_mhz: Option<f64>,
    #[serde(rename = "cu", default, deserialize_with = "lenient::floats")]
    pub cpu_user_pct: Option<Vec<f64>>,
    #[serde(rename = "cs", default, deserialize_with = "lenient::floats")]
    pub cpu_sys_pct: Option<Vec<f64>>,
    #[serde(rename = "ci", default, deserialize_with = "lenient::floats")]
    pub cpu_idle_pct: Option<Vec<f64>>,
    #[serde(rename = "ac", default, deserialize_with = "lenient::float")]
    pub audio_kbps: Option<f64>,
    #[serde(rename = "wc", default, deserialize_with = "lenient::float")]
    pub waterfall_kbps: Option<f64>,
    #[serde(rename = "ah", default, deserialize_with = "lenient::float")]
    pub http_kbps: Option<f64>,
    #[serde(rename = "ad", default, deserialize_with = "lenient::int")]
    pub dropped: Option<u64>,
    #[serde(rename = "au", default, deserialize_with = "lenient::int")]
    pub underruns: Option<u64>,
    #[serde(rename = "as", default, deserialize_with = "lenient::int")]
    pub sequence_errors: Option<u64>,
    #[serde(rename = "ar", default, deserialize_with = "lenient::int")]
    pub realtime_errors: Option<u64>,
    #[serde(rename = "ga", default, deserialize_with = "lenient::flag")]
    pub gps_acquiring: Option<bool>,
    #[serde(rename = "gt", default, deserialize_with = "lenient::int")]
    pub gps_tracking: Option<u32>,
    #[serde(rename = "gg", default, deserialize_with = "lenient::int")]
    pub gps_good: Option<u32>,
    #[serde(rename = "gf", default, deserialize_with = "lenient::int")]
    pub gps_fixes: Option<u64>,
    #[serde(rename = "gc", default, deserialize_with = "lenient::float")]
    pub adc_clock_mhz: Option<f64>,
    #[serde(rename = "gr", default, deserialize_with = "lenient::text")]
    pub grid: Option<String>,
}

// ── gps_update_cb / gps_POS_data_cb ──────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteEntry {
    #[serde(rename = "ch", default, deserialize_with = "lenient::int")]
    pub channel: Option<u32>,
    /// Constellation code: `N` NavStar, `G` GLONASS, `B` BeiDou, ...
    #[serde(rename = "prn_s", default, deserialize_with = "lenient::text")]
    pub system: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub prn: Option<u32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub snr: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub rssi: Option<i32>,
    #[serde(rename = "az", default, deserialize_with = "lenient::int")]
    pub azimuth: Option<i32>,
    #[serde(rename = "el", default, deserialize_with = "lenient::int")]
    pub elevation: Option<i32>,
    #[serde(rename = "soln", default, deserialize_with = "lenient::flag")]
    pub in_solution: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteUpdate {
    #[serde(rename = "ch", default, deserialize_with = "lenient::list")]
    pub satellites: Option<Vec<SatelliteEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    #[serde(default, deserialize_with = "lenient::float")]
    pub ref_lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub ref_lon: Option<f64>,
}

// ── load_cfg / cfg ───────────────────────────────────────────────────

/// `WSPR` or `ft8` section of the general config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReporterSection {
    #[serde(default, deserialize_with = "lenient::text")]
    pub callsign: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub grid: Option<String>,
    #[serde(
        rename = "SNR_adj",
        alias = "SNR_correction",
        default,
        deserialize_with = "lenient::int"
    )]
    pub snr_adjust: Option<i32>,
    #[serde(
        rename = "dT_adj",
        alias = "dT_correction",
        default,
        deserialize_with = "lenient::int"
    )]
    pub dt_adjust: Option<i32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub spot_log: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub syslog: Option<bool>,
    #[serde(rename = "GPS_update_grid", default, deserialize_with = "lenient::flag")]
    pub gps_update_grid: Option<bool>,
    /// `autorun0`..`autorunN` and anything else the section carries.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ReporterSection {
    /// Band codes of the autorun slots `autorun0..slots` (0 = disabled).
    pub fn autorun(&self, slots: usize) -> Vec<u32> {
        (0..slots)
            .map(|i| {
                self.extra
                    .get(&format!("autorun{i}"))
                    .and_then(lenient::as_i64)
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnableFlag {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TdoaSection {
    #[serde(default, deserialize_with = "lenient::text")]
    pub server: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexHtmlParams {
    #[serde(rename = "RX_QRA", default, deserialize_with = "lenient::text")]
    pub rx_qra: Option<String>,
}

/// General device config (`load_cfg` / `cfg`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(rename = "WSPR", alias = "wspr", default, deserialize_with = "lenient::object")]
    pub wspr: Option<ReporterSection>,
    #[serde(rename = "ft8", alias = "FT8", default, deserialize_with = "lenient::object")]
    pub ft8: Option<ReporterSection>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rx_grid: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub index_html_params: Option<IndexHtmlParams>,

    #[serde(rename = "S_meter_cal", default, deserialize_with = "lenient::int")]
    pub s_meter_cal: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub waterfall_cal: Option<i32>,
    #[serde(rename = "DC_offset_I", default, deserialize_with = "lenient::float")]
    pub dc_offset_i: Option<f64>,
    #[serde(rename = "DC_offset_Q", default, deserialize_with = "lenient::float")]
    pub dc_offset_q: Option<f64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub clk_adj: Option<i64>,
    #[serde(rename = "ADC_clk2_corr", default, deserialize_with = "lenient::int")]
    pub adc_clk_corr: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub overload_mute: Option<i32>,

    #[serde(rename = "DRM", default, deserialize_with = "lenient::object")]
    pub drm: Option<EnableFlag>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub spectral_inversion: Option<bool>,
    #[serde(rename = "ext_ADC_clk", default, deserialize_with = "lenient::flag")]
    pub ext_adc_clk: Option<bool>,
    #[serde(rename = "no_wf", default, deserialize_with = "lenient::flag")]
    pub no_waterfall: Option<bool>,

    #[serde(default, deserialize_with = "lenient::int")]
    pub inactivity_timeout_mins: Option<u32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub ip_limit_mins: Option<u32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub chan_no_pwd: Option<u32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub n_camp: Option<u32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub ext_api_nchans: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub tdoa_nchans: Option<i32>,

    #[serde(default, deserialize_with = "lenient::int")]
    pub nb_algo: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub nb_thresh: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub nb_gate: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub nr_algo: Option<i32>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub rx_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rx_device: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rx_location: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rx_antenna: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub rx_asl: Option<i32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rx_gps: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub owner_info: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub admin_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub tdoa: Option<TdoaSection>,
}

// ── load_adm ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpAddressSection {
    #[serde(default, deserialize_with = "lenient::text")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub use_static: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub netmask: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub gateway: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mac: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mac_address: Option<String>,
}

impl IpAddressSection {
    pub fn mac(&self) -> Option<&str> {
        first_non_empty(&[self.mac.as_deref(), self.mac_address.as_deref()])
    }
}

/// Admin config (`load_adm`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enable_gps: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub gps_corr: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub airband: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub narrowband: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub wf_share: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub server_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub use_ssl: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub sdr_hu_register: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub kiwisdr_com_register: Option<bool>,
    #[serde(rename = "ip_blacklist_auto_download", default, deserialize_with = "lenient::flag")]
    pub ip_blacklist_auto: Option<bool>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub ip_blacklist_mtime: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub port: Option<u16>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub ip_address: Option<IpAddressSection>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mac: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mac_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub ethernet_mac: Option<String>,
}

impl AdminConfig {
    /// MAC advertised at the top level of the message (some firmware).
    pub fn top_level_mac(&self) -> Option<&str> {
        first_non_empty(&[
            self.mac.as_deref(),
            self.mac_address.as_deref(),
            self.ethernet_mac.as_deref(),
        ])
    }

    /// MAC nested under `ip_address`.
    pub fn nested_mac(&self) -> Option<&str> {
        self.ip_address.as_ref().and_then(IpAddressSection::mac)
    }
}

// ── config_cb ────────────────────────────────────────────────────────

/// Device identity (`config_cb`), the reply to `SET GET_CONFIG`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "m", default, deserialize_with = "lenient::text")]
    pub mac: Option<String>,
    /// Number on current firmware, string on older builds.
    #[serde(rename = "s", default, deserialize_with = "lenient::text")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dna: Option<String>,
    #[serde(rename = "pu", default, deserialize_with = "lenient::text")]
    pub public_ip: Option<String>,
    #[serde(rename = "pv", default, deserialize_with = "lenient::text")]
    pub private_ip: Option<String>,
    #[serde(rename = "v1", default, deserialize_with = "lenient::int")]
    pub version_major: Option<u32>,
    #[serde(rename = "v2", default, deserialize_with = "lenient::int")]
    pub version_minor: Option<u32>,
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn autorun_slots_default_to_zero() {
        let section: ReporterSection = serde_json::from_value(json!({
            "callsign": "KC0XYZ",
            "autorun0": 7,
            "autorun2": "5",
            "autorun3": "bogus"
        }))
        .unwrap();
        assert_eq!(section.autorun(4), vec![7, 0, 5, 0]);
        assert_eq!(section.callsign.as_deref(), Some("KC0XYZ"));
    }

    #[test]
    fn correction_aliases_are_accepted() {
        let section: ReporterSection =
            serde_json::from_value(json!({ "SNR_correction": -3, "dT_correction": "1" })).unwrap();
        assert_eq!(section.snr_adjust, Some(-3));
        assert_eq!(section.dt_adjust, Some(1));
    }

    #[test]
    fn wrong_shaped_section_is_dropped() {
        let cfg: GeneralConfig =
            serde_json::from_value(json!({ "DRM": true, "rx_name": "Rooftop" })).unwrap();
        assert_eq!(cfg.drm, None);
        assert_eq!(cfg.rx_name.as_deref(), Some("Rooftop"));
    }

    #[test]
    fn admin_mac_sources() {
        let adm: AdminConfig = serde_json::from_value(json!({
            "ethernet_mac": "aa:bb:cc:dd:ee:ff",
            "ip_address": { "mac": "", "mac_address": "11:22:33:44:55:66" }
        }))
        .unwrap();
        assert_eq!(adm.top_level_mac(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(adm.nested_mac(), Some("11:22:33:44:55:66"));
    }

    #[test]
    fn identity_serial_accepts_numbers() {
        let id: Identity =
            serde_json::from_value(json!({ "m": "6a:8c:58:18:61:f0", "s": 24_120_097 })).unwrap();
        assert_eq!(id.serial.as_deref(), Some("24120097"));
    }
}
