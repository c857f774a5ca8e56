// ── Wire-to-model merges ──
//
// Applies parsed `web888_api` payloads onto the canonical `Status`. Every
// merge is field-by-field: a key the payload did not carry never touches
// the existing value. Sections that only the admin WebSocket fills are
// skipped while the status is in HTTP mode.

use web888_api::admin::{
    AdminConfig, GeneralConfig, Identity, PositionUpdate, ReporterSection, SatelliteEntry,
    StatsBlock, UserEntry,
};
use web888_api::{AdminMessage, StatusReport};

use crate::config::CHANNEL_SLOTS;
use crate::model::{
    Channel, ChannelActivity, DeviceConfig, MacSource, ReporterConfig, Satellite, Status,
};

// ── Helpers ────────────────────────────────────────────────────────

fn put<T>(dst: &mut T, src: Option<T>) {
    if let Some(value) = src {
        *dst = value;
    }
}

fn put_opt<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dst = src;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ── HTTP /status ───────────────────────────────────────────────────

/// Merge one parsed `/status` response. Returns `true` if any field was
/// present in the report.
pub fn apply_report(status: &mut Status, report: StatusReport) -> bool {
    if report.is_empty() {
        return false;
    }

    put_opt(&mut status.name, report.name);
    put_opt(&mut status.location, report.location);
    put_opt(&mut status.sw_version, report.sw_version);
    put_opt(&mut status.antenna, report.antenna);
    put_opt(&mut status.bands, report.bands);
    put_opt(&mut status.uptime_seconds, report.uptime_seconds);
    put_opt(&mut status.users, report.users);
    put_opt(&mut status.users_max, report.users_max);
    put_opt(&mut status.access, report.access);
    put_opt(&mut status.offline, report.offline);
    put_opt(&mut status.operator_email, report.operator_email);
    put_opt(&mut status.antenna_connected, report.antenna_connected);
    put_opt(&mut status.adc_overflow, report.adc_overflow);
    put_opt(&mut status.snr, report.snr);
    put_opt(&mut status.hardware, report.hardware);
    put_opt(&mut status.freq_offset_hz, report.freq_offset_hz);

    let gps = &mut status.gps;
    if let Some(coords) = report.gps {
        gps.latitude = Some(coords.latitude);
        gps.longitude = Some(coords.longitude);
    }
    put_opt(&mut gps.good, report.gps_good);
    put_opt(&mut gps.fixes, report.gps_fixes);
    put_opt(&mut gps.fixes_per_min, report.gps_fixes_per_min);
    put_opt(&mut gps.fixes_per_hour, report.gps_fixes_per_hour);
    put_opt(&mut gps.altitude_m, report.altitude_m);

    true
}

// ── Admin WebSocket ────────────────────────────────────────────────

/// Merge one admin message. Returns `true` if the status changed shape
/// or content; control messages (`badp`, `cfg_loaded`, unknown tags) and
/// WebSocket-only data arriving in HTTP mode return `false`.
pub fn apply_message(status: &mut Status, message: AdminMessage) -> bool {
    match message {
        AdminMessage::Users(users) => apply_users(status, users),
        AdminMessage::Stats(stats) => apply_stats(status, *stats),
        AdminMessage::Satellites(update) => match update.satellites {
            Some(entries) => apply_satellites(status, entries),
            None => false,
        },
        AdminMessage::Position(position) => apply_position(status, position),
        AdminMessage::Config(config) => apply_general_config(status, *config),
        AdminMessage::Admin(admin) => apply_admin_config(status, *admin),
        AdminMessage::Identity(identity) => apply_identity(status, identity),
        AdminMessage::AuthResult { .. }
        | AdminMessage::ConfigLoaded
        | AdminMessage::Other { .. } => false,
    }
}

fn channel_from_entry(position: usize, entry: UserEntry) -> Channel {
    let activity = entry
        .activity
        .as_deref()
        .map(ChannelActivity::parse)
        .unwrap_or_default();
    Channel {
        index: entry
            .index
            .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX)),
        name: entry.name.unwrap_or_default(),
        frequency_hz: entry.frequency_hz.unwrap_or(0),
        mode: entry.mode.unwrap_or_default(),
        client_address: entry.client_address.unwrap_or_default(),
        extension: entry.extension.unwrap_or_default(),
        decoded_count: activity.decoded_count,
        session_time: entry.session_time.unwrap_or_default(),
        preemptible: activity.preemptible,
    }
}

/// `user_cb` replaces the channel list wholesale and recounts users.
fn apply_users(status: &mut Status, users: Vec<UserEntry>) -> bool {
    let Some(channels) = status.channels.as_mut() else {
        return false;
    };
    *channels = users
        .into_iter()
        .enumerate()
        .map(|(i, entry)| channel_from_entry(i, entry))
        .collect();
    let active = channels.iter().filter(|c| c.is_active()).count();
    status.users = Some(u32::try_from(active).unwrap_or(u32::MAX));
    true
}

fn apply_stats(status: &mut Status, stats: StatsBlock) -> bool {
    let Some(system) = status.system.as_mut() else {
        return false;
    };

    put(&mut system.cpu_temp_c, stats.cpu_temp_c);
    put(&mut system.cpu_freq_mhz, stats.cpu_freq_mhz);
    put(&mut system.cpu_user_pct, stats.cpu_user_pct);
    put(&mut system.cpu_sys_pct, stats.cpu_sys_pct);
    put(&mut system.cpu_idle_pct, stats.cpu_idle_pct);
    put(&mut system.audio_kbps, stats.audio_kbps);
    put(&mut system.waterfall_kbps, stats.waterfall_kbps);
    put(&mut system.http_kbps, stats.http_kbps);
    put(&mut system.dropped, stats.dropped);
    put(&mut system.underruns, stats.underruns);
    put(&mut system.sequence_errors, stats.sequence_errors);
    put(&mut system.realtime_errors, stats.realtime_errors);

    put_opt(&mut status.uptime_seconds, stats.uptime_seconds);
    put_opt(&mut status.gps.good, stats.gps_good);
    put_opt(&mut status.gps.fixes, stats.gps_fixes);

    if let Some(receiver) = status.gps.receiver.as_mut() {
        put(&mut receiver.acquiring, stats.gps_acquiring);
        put(&mut receiver.tracking, stats.gps_tracking);
        put(&mut receiver.adc_clock_mhz, stats.adc_clock_mhz);
        put(&mut receiver.grid, stats.grid);
    }
    true
}

fn satellite_from_entry(entry: SatelliteEntry) -> Satellite {
    Satellite {
        channel: entry.channel.unwrap_or(0),
        system: entry.system.unwrap_or_default(),
        prn: entry.prn.unwrap_or(0),
        snr: entry.snr.unwrap_or(0),
        rssi: entry.rssi.unwrap_or(0),
        azimuth: entry.azimuth.unwrap_or(0),
        elevation: entry.elevation.unwrap_or(0),
        in_solution: entry.in_solution.unwrap_or(false),
    }
}

fn apply_satellites(status: &mut Status, entries: Vec<SatelliteEntry>) -> bool {
    let Some(satellites) = status.gps.satellites.as_mut() else {
        return false;
    };
    *satellites = entries.into_iter().map(satellite_from_entry).collect();
    true
}

fn apply_position(status: &mut Status, position: PositionUpdate) -> bool {
    if !status.mode.is_websocket() || (position.ref_lat.is_none() && position.ref_lon.is_none()) {
        return false;
    }
    put_opt(&mut status.gps.latitude, position.ref_lat);
    put_opt(&mut status.gps.longitude, position.ref_lon);
    true
}

fn autorun_if_present(section: &ReporterSection) -> Option<Vec<u32>> {
    section
        .extra
        .keys()
        .any(|k| k.starts_with("autorun"))
        .then(|| section.autorun(CHANNEL_SLOTS))
}

fn merge_reporter(reporter: &mut ReporterConfig, config: &GeneralConfig) {
    let fallback_grid = non_empty(config.rx_grid.clone()).or_else(|| {
        non_empty(
            config
                .index_html_params
                .as_ref()
                .and_then(|p| p.rx_qra.clone()),
        )
    });

    if let Some(wspr) = config.wspr.as_ref() {
        put(&mut reporter.wspr_callsign, non_empty(wspr.callsign.clone()));
        put(&mut reporter.wspr_grid, non_empty(wspr.grid.clone()));
        put(&mut reporter.wspr_autorun, autorun_if_present(wspr));
    }
    if reporter.wspr_grid.is_empty() {
        put(&mut reporter.wspr_grid, fallback_grid);
    }

    if let Some(ft8) = config.ft8.as_ref() {
        put(&mut reporter.ft8_callsign, non_empty(ft8.callsign.clone()));
        put(&mut reporter.ft8_grid, non_empty(ft8.grid.clone()));
        put(&mut reporter.snr_correction, ft8.snr_adjust);
        put(&mut reporter.dt_correction, ft8.dt_adjust);
        put(&mut reporter.ft8_autorun, autorun_if_present(ft8));
    }
}

fn merge_general_config(device: &mut DeviceConfig, config: GeneralConfig) {
    put(&mut device.s_meter_cal, config.s_meter_cal);
    put(&mut device.waterfall_cal, config.waterfall_cal);
    put(&mut device.dc_offset_i, config.dc_offset_i);
    put(&mut device.dc_offset_q, config.dc_offset_q);
    put(&mut device.clk_adj, config.clk_adj);
    put(&mut device.adc_clk_corr, config.adc_clk_corr);
    put(&mut device.overload_mute, config.overload_mute);

    put(&mut device.drm_enabled, config.drm.and_then(|d| d.enable));
    if let Some(wspr) = config.wspr {
        put(&mut device.wspr_enabled, wspr.enable);
        put(&mut device.wspr_spot_log, wspr.spot_log);
        put(&mut device.wspr_syslog, wspr.syslog);
        put(&mut device.wspr_gps_update_grid, wspr.gps_update_grid);
    }
    put(&mut device.spectral_inversion, config.spectral_inversion);
    put(&mut device.ext_adc_clk, config.ext_adc_clk);
    put(&mut device.no_waterfall, config.no_waterfall);

    put(&mut device.inactivity_timeout_mins, config.inactivity_timeout_mins);
    put(&mut device.ip_limit_mins, config.ip_limit_mins);
    put(&mut device.chan_no_pwd, config.chan_no_pwd);
    put(&mut device.n_camp, config.n_camp);
    put(&mut device.ext_api_nchans, config.ext_api_nchans);
    put(&mut device.tdoa_nchans, config.tdoa_nchans);

    put(&mut device.nb_algo, config.nb_algo);
    put(&mut device.nb_thresh, config.nb_thresh);
    put(&mut device.nb_gate, config.nb_gate);
    put(&mut device.nr_algo, config.nr_algo);

    put(&mut device.rx_name, config.rx_name);
    put(&mut device.rx_device, config.rx_device);
    put(&mut device.rx_location, config.rx_location);
    put(&mut device.rx_antenna, config.rx_antenna);
    put(&mut device.rx_asl, config.rx_asl);
    put(&mut device.rx_gps, config.rx_gps);
    put(&mut device.owner_info, config.owner_info);
    put(&mut device.admin_email, config.admin_email);
    put(&mut device.tdoa_server, config.tdoa.and_then(|t| t.server));
}

/// `load_cfg` deep-merges into the reporter identity and device config.
fn apply_general_config(status: &mut Status, config: GeneralConfig) -> bool {
    if let Some(reporter) = status.reporter.as_mut() {
        merge_reporter(reporter, &config);
    }
    let Some(device) = status.config.as_mut() else {
        return false;
    };
    merge_general_config(device, config);
    true
}

fn apply_admin_config(status: &mut Status, admin: AdminConfig) -> bool {
    let Some(device) = status.config.as_mut() else {
        return false;
    };

    if let Some(mac) = admin.top_level_mac() {
        device.discover_mac(mac, MacSource::AdminTopLevel);
    }
    if let Some(mac) = admin.nested_mac() {
        device.discover_mac(mac, MacSource::AdminNested);
    }

    put(&mut device.enable_gps, admin.enable_gps);
    put(&mut device.gps_corr, admin.gps_corr);
    put(&mut device.airband, admin.airband);
    put(&mut device.narrowband, admin.narrowband);
    put(&mut device.wf_share, admin.wf_share);
    put(&mut device.server_enabled, admin.server_enabled);
    put(&mut device.use_ssl, admin.use_ssl);
    put(&mut device.sdr_hu_register, admin.sdr_hu_register);
    put(&mut device.kiwisdr_com_register, admin.kiwisdr_com_register);
    put(&mut device.ip_blacklist_auto, admin.ip_blacklist_auto);
    put(&mut device.ip_blacklist_mtime, admin.ip_blacklist_mtime);
    put(&mut device.port, admin.port);

    if let Some(ip) = admin.ip_address {
        put(&mut device.configured_ip, ip.ip);
        put(&mut device.use_static_ip, ip.use_static);
        put(&mut device.netmask, ip.netmask);
        put(&mut device.gateway, ip.gateway);
    }
    true
}

fn apply_identity(status: &mut Status, identity: Identity) -> bool {
    let Some(device) = status.config.as_mut() else {
        return false;
    };

    if let Some(mac) = identity.mac.as_deref() {
        device.discover_mac(mac, MacSource::Identity);
    }
    put(&mut device.serial_number, non_empty(identity.serial));
    put(&mut device.dna, non_empty(identity.dna));
    put(&mut device.public_ip, non_empty(identity.public_ip));
    put(&mut device.private_ip, non_empty(identity.private_ip));
    if let Some(major) = identity.version_major {
        device.firmware_version = match identity.version_minor {
            Some(minor) => format!("{major}.{minor}"),
            None => major.to_string(),
        };
    }
    true
}
