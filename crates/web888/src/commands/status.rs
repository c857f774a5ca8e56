//! `status`: one connect, one snapshot, close.

use std::fmt::Write as _;
use std::time::Duration;

use tabled::Tabled;

use web888_core::{Channel, Monitor, Satellite, Snapshot};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "#")]
    index: u32,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "kHz")]
    freq: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Decodes")]
    decodes: u64,
}

impl From<&Channel> for ChannelRow {
    fn from(c: &Channel) -> Self {
        let active = c.is_active();
        Self {
            index: c.index,
            kind: c.kind().to_string(),
            freq: if active {
                format!("{:.2}", c.frequency_khz())
            } else {
                String::new()
            },
            mode: c.mode.clone(),
            name: c.name.clone(),
            client: c.client_address.clone(),
            time: c.session_time.clone(),
            decodes: c.decoded_count,
        }
    }
}

#[derive(Tabled)]
struct SatelliteRow {
    #[tabled(rename = "Ch")]
    channel: String,
    #[tabled(rename = "PRN")]
    prn: String,
    #[tabled(rename = "SNR")]
    snr: String,
    #[tabled(rename = "Az")]
    azimuth: String,
    #[tabled(rename = "El")]
    elevation: String,
    #[tabled(rename = "Soln")]
    in_solution: String,
}

impl From<Option<&Satellite>> for SatelliteRow {
    fn from(slot: Option<&Satellite>) -> Self {
        match slot {
            Some(s) => Self {
                channel: s.channel.to_string(),
                prn: format!("{}{}", s.system, s.prn),
                snr: s.snr.to_string(),
                azimuth: s.azimuth.to_string(),
                elevation: s.elevation.to_string(),
                in_solution: if s.in_solution { "*".into() } else { String::new() },
            },
            None => Self {
                channel: "-".into(),
                prn: String::new(),
                snr: String::new(),
                azimuth: String::new(),
                elevation: String::new(),
                in_solution: String::new(),
            },
        }
    }
}

// ── Detail view ─────────────────────────────────────────────────────

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

/// Multi-section human view of a snapshot.
#[allow(clippy::too_many_lines)]
pub fn detail(snap: &Snapshot, p: Painter) -> String {
    let s = &snap.status;
    let mut out = String::new();

    let _ = writeln!(out, "{}", p.heading("Receiver"));
    let _ = writeln!(out, "  Name:       {}", or_dash(s.name.as_deref()));
    let _ = writeln!(out, "  Location:   {}", or_dash(s.location.as_deref()));
    let _ = writeln!(
        out,
        "  Hardware:   {} ({})",
        or_dash(s.hardware.as_deref()),
        or_dash(s.sw_version.as_deref())
    );
    let antenna_state = match s.antenna_connected {
        Some(true) => p.good("connected"),
        Some(false) => p.bad("disconnected"),
        None => p.dim("unknown"),
    };
    let _ = writeln!(
        out,
        "  Antenna:    {} [{antenna_state}]",
        or_dash(s.antenna.as_deref())
    );
    let _ = writeln!(out, "  Bands:      {}", or_dash(s.bands.as_deref()));
    let _ = writeln!(
        out,
        "  Link:       {} via {}",
        p.flag(s.connected, "connected", "disconnected"),
        s.mode
    );
    if s.offline == Some(true) {
        let _ = writeln!(out, "  Access:     {}", p.bad("offline"));
    } else {
        let _ = writeln!(out, "  Access:     {}", or_dash(s.access.as_deref()));
    }
    let _ = writeln!(
        out,
        "  Users:      {}/{}",
        opt(s.users),
        opt(s.users_max)
    );
    let _ = writeln!(out, "  Uptime:     {}", opt(s.uptime_formatted()));
    let _ = writeln!(
        out,
        "  SNR:        all {} / HF {} dB",
        opt(s.snr_all()),
        opt(s.snr_hf())
    );
    let _ = writeln!(out, "  ADC OV:     {}", opt(s.adc_overflow));
    if let Some(offset) = s.freq_offset_hz {
        let _ = writeln!(out, "  Freq off:   {offset:.3} Hz");
    }
    let _ = writeln!(
        out,
        "  MAC:        {}",
        opt(snap.mac_address.as_ref())
    );
    if let Some(ref id) = snap.correlation_id {
        let _ = writeln!(out, "  Corr. ID:   {id}");
    }

    let _ = writeln!(out, "\n{}", p.heading("GPS"));
    let lock = match s.gps.has_lock() {
        Some(true) => p.good("locked"),
        Some(false) => p.bad("no fix"),
        None => p.dim("unknown"),
    };
    let _ = writeln!(out, "  Lock:       {lock}");
    let _ = writeln!(
        out,
        "  Fixes:      {} ({}/min, {}/h), {} good",
        opt(s.gps.fixes),
        opt(s.gps.fixes_per_min),
        opt(s.gps.fixes_per_hour),
        opt(s.gps.good)
    );
    if let (Some(lat), Some(lon)) = (s.gps.latitude, s.gps.longitude) {
        let _ = writeln!(
            out,
            "  Position:   {lat:.5}, {lon:.5} ({} m)",
            opt(s.gps.altitude_m)
        );
    }
    if let Some(ref rx) = s.gps.receiver {
        let _ = writeln!(
            out,
            "  Receiver:   tracking {}, grid {}, ADC {:.6} MHz{}",
            rx.tracking,
            or_dash(Some(rx.grid.as_str())),
            rx.adc_clock_mhz,
            if rx.acquiring { ", acquiring" } else { "" }
        );
    }
    if let Some(sum) = s.gps.satellite_summary() {
        let _ = writeln!(
            out,
            "  Satellites: {} tracked, {} in solution, mean SNR {}",
            sum.tracked,
            sum.in_solution,
            sum.mean_snr
                .map_or_else(|| "-".into(), |v| format!("{v:.1}"))
        );
    }

    if let Some(ref sys) = s.system {
        let _ = writeln!(out, "\n{}", p.heading("System"));
        let temp = format!("{:.1} °C", sys.cpu_temp_c);
        let temp = match snap.thermal_warning {
            Some(true) => p.bad(&temp),
            _ => temp,
        };
        let _ = writeln!(
            out,
            "  CPU:        {temp} @ {:.0} MHz, {} user (threshold {:.1} °C)",
            sys.cpu_freq_mhz,
            sys.cpu_usage_avg()
                .map_or_else(|| "-".into(), |v| format!("{v:.1}%")),
            snap.thermal_threshold_c
        );
        let _ = writeln!(
            out,
            "  Traffic:    {:.1} kbps (audio {:.1}, waterfall {:.1}, http {:.1})",
            sys.total_kbps(),
            sys.audio_kbps,
            sys.waterfall_kbps,
            sys.http_kbps
        );
        let _ = writeln!(
            out,
            "  Errors:     {} dropped, {} underruns, {} seq, {} realtime",
            sys.dropped, sys.underruns, sys.sequence_errors, sys.realtime_errors
        );
    }

    if let Some(ref rep) = s.reporter {
        let _ = writeln!(out, "\n{}", p.heading("Reporter"));
        let _ = writeln!(
            out,
            "  Identity:   {} @ {}",
            or_dash(Some(rep.callsign())),
            or_dash(Some(rep.grid()))
        );
        let _ = writeln!(
            out,
            "  Autorun:    {} FT8, {} WSPR",
            rep.active_ft8_slots(),
            rep.active_wspr_slots()
        );
    }

    if let Some(ref cfg) = s.config {
        if !cfg.serial_number.is_empty() || !cfg.firmware_version.is_empty() {
            let _ = writeln!(
                out,
                "  Device:     serial {}, firmware {}",
                or_dash(Some(cfg.serial_number.as_str())),
                or_dash(Some(cfg.firmware_version.as_str()))
            );
        }
    }

    if let Some(ref slots) = snap.channel_slots {
        let _ = writeln!(out, "\n{}", p.heading("Channels"));
        if let Some(sum) = s.channel_summary() {
            let _ = writeln!(
                out,
                "  {} active: {} users, {} FT8, {} WSPR, {} local, {} other; {} decodes",
                sum.active,
                sum.users,
                sum.ft8,
                sum.wspr,
                sum.local,
                sum.other_extensions,
                sum.total_decodes
            );
        }
        let rows: Vec<ChannelRow> = slots.iter().map(ChannelRow::from).collect();
        let _ = writeln!(out, "{}", output::render_table(&rows));
    }

    if let Some(ref slots) = snap.satellite_slots {
        let _ = writeln!(out, "\n{}", p.heading("Satellites"));
        let rows: Vec<SatelliteRow> = slots
            .iter()
            .map(|slot| SatelliteRow::from(slot.as_ref()))
            .collect();
        let _ = writeln!(out, "{}", output::render_table(&rows));
    }

    out.trim_end().to_owned()
}

/// One line per snapshot, for `watch` in table mode.
pub fn summary_line(snap: &Snapshot, p: Painter) -> String {
    let s = &snap.status;
    let mut line = format!(
        "{}  {}  {}  users {}/{}  snr {}/{}  gps {}",
        snap.taken_at.format("%Y-%m-%d %H:%M:%S"),
        or_dash(s.name.as_deref()),
        p.flag(s.connected, "up", "down"),
        opt(s.users),
        opt(s.users_max),
        opt(s.snr_all()),
        opt(s.snr_hf()),
        opt(s.gps.fixes),
    );
    if let Some(temp) = s.cpu_temp_c() {
        let temp = format!("{temp:.1}°C");
        let temp = if snap.thermal_warning == Some(true) {
            p.bad(&temp)
        } else {
            temp
        };
        let _ = write!(line, "  cpu {temp}");
    }
    line
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: StatusArgs,
    resolved: Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let address = resolved.address();
    let Resolved {
        profile_name,
        config,
    } = resolved;

    let snapshot = Monitor::oneshot(config, Duration::from_secs(args.settle))
        .await
        .map_err(|e| CliError::from_core(e, &address, &profile_name))?;

    let painter = Painter::new(&global.color);
    let out = output::render_single(&global.output, &snapshot, |s| detail(s, painter))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
