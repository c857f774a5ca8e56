// ── Device configuration (WebSocket only) ──
//
// Built up from three admin messages: general config (`load_cfg`), admin
// config (`load_adm`) and the identity reply (`config_cb`). Each message
// only overwrites the fields it carries.

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// Where a discovered MAC came from, lowest rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacSource {
    /// `ip_address.mac` inside the admin config.
    AdminNested,
    /// `mac` / `mac_address` / `ethernet_mac` at the admin config top level.
    AdminTopLevel,
    /// `m` in the identity reply.
    Identity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // Calibration
    pub s_meter_cal: i32,
    pub waterfall_cal: i32,
    pub dc_offset_i: f64,
    pub dc_offset_q: f64,
    pub clk_adj: i64,
    pub adc_clk_corr: i64,
    pub overload_mute: i32,

    // Feature flags
    pub drm_enabled: bool,
    pub wspr_enabled: bool,
    pub wspr_spot_log: bool,
    pub wspr_syslog: bool,
    pub wspr_gps_update_grid: bool,
    pub spectral_inversion: bool,
    pub ext_adc_clk: bool,
    pub no_waterfall: bool,

    // Session / access limits
    pub inactivity_timeout_mins: u32,
    pub ip_limit_mins: u32,
    pub chan_no_pwd: u32,
    pub n_camp: u32,
    pub ext_api_nchans: i32,
    pub tdoa_nchans: i32,

    // Noise reduction
    pub nb_algo: i32,
    pub nb_thresh: i32,
    pub nb_gate: i32,
    pub nr_algo: i32,

    // Identity as configured
    pub rx_name: String,
    pub rx_device: String,
    pub rx_location: String,
    pub rx_antenna: String,
    pub rx_asl: i32,
    pub rx_gps: String,
    pub owner_info: String,
    pub admin_email: String,
    pub tdoa_server: String,

    // Admin flags
    pub enable_gps: bool,
    pub gps_corr: bool,
    pub airband: bool,
    pub narrowband: bool,
    pub wf_share: bool,
    pub server_enabled: bool,
    pub use_ssl: bool,
    pub sdr_hu_register: bool,
    pub kiwisdr_com_register: bool,
    pub ip_blacklist_auto: bool,
    pub ip_blacklist_mtime: i64,

    // Network
    pub configured_ip: String,
    pub use_static_ip: bool,
    pub port: u16,
    pub netmask: String,
    pub gateway: String,

    // Hardware identity
    pub mac_address: Option<MacAddress>,
    pub mac_source: Option<MacSource>,
    pub serial_number: String,
    pub dna: String,
    pub public_ip: String,
    pub private_ip: String,
    /// `major.minor` as reported by the identity reply.
    pub firmware_version: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            s_meter_cal: 0,
            waterfall_cal: 0,
            dc_offset_i: 0.0,
            dc_offset_q: 0.0,
            clk_adj: 0,
            adc_clk_corr: 0,
            overload_mute: 0,
            drm_enabled: false,
            wspr_enabled: false,
            wspr_spot_log: false,
            wspr_syslog: false,
            wspr_gps_update_grid: false,
            spectral_inversion: false,
            ext_adc_clk: false,
            no_waterfall: false,
            inactivity_timeout_mins: 0,
            ip_limit_mins: 0,
            chan_no_pwd: 0,
            n_camp: 0,
            ext_api_nchans: 0,
            tdoa_nchans: -1,
            nb_algo: 0,
            nb_thresh: 0,
            nb_gate: 0,
            nr_algo: 0,
            rx_name: String::new(),
            rx_device: String::new(),
            rx_location: String::new(),
            rx_antenna: String::new(),
            rx_asl: 0,
            rx_gps: String::new(),
            owner_info: String::new(),
            admin_email: String::new(),
            tdoa_server: String::new(),
            enable_gps: true,
            gps_corr: true,
            airband: false,
            narrowband: false,
            wf_share: false,
            server_enabled: true,
            use_ssl: false,
            sdr_hu_register: false,
            kiwisdr_com_register: false,
            ip_blacklist_auto: false,
            ip_blacklist_mtime: 0,
            configured_ip: String::new(),
            use_static_ip: false,
            port: web888_api::DEFAULT_PORT,
            netmask: String::new(),
            gateway: String::new(),
            mac_address: None,
            mac_source: None,
            serial_number: String::new(),
            dna: String::new(),
            public_ip: String::new(),
            private_ip: String::new(),
            firmware_version: String::new(),
        }
    }
}

impl DeviceConfig {
    /// Record a discovered MAC unless a higher-ranked source already set one.
    /// Returns `true` if the stored MAC changed.
    pub fn discover_mac(&mut self, raw: &str, source: MacSource) -> bool {
        let raw = raw.trim();
        if raw.is_empty() || self.mac_source.is_some_and(|current| current > source) {
            return false;
        }
        let mac = MacAddress::new(raw);
        let changed = self.mac_address.as_ref() != Some(&mac);
        self.mac_address = Some(mac);
        self.mac_source = Some(source);
        changed
    }
}
