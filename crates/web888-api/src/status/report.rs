// Parser for the plaintext `/status` page.
//
// One `key=value` pair per line. Values may contain spaces, so lines are
// split on the first `=` only. Every recognized key is coerced on its own;
// a bad value becomes a `FieldIssue` and the rest of the body still parses.

use serde::Serialize;
use tracing::debug;

/// Outcome of coercing one raw value into a typed field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Present(T),
    /// The key was sent with an empty value.
    Absent,
    Invalid(String),
}

/// A single line that was recognized but could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Position as reported by the `gps=(lat, lon)` line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Partial field-set parsed from one `/status` response.
///
/// Every field is `None` unless its key appeared with a valid value, so the
/// report can be merged over previous state without zeroing anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub name: Option<String>,
    pub location: Option<String>,
    pub sw_version: Option<String>,
    pub antenna: Option<String>,
    pub bands: Option<String>,
    pub uptime_seconds: Option<u64>,
    pub users: Option<u32>,
    pub users_max: Option<u32>,
    /// `status=` line: `private`, `public`, ...
    pub access: Option<String>,
    pub offline: Option<bool>,
    pub operator_email: Option<String>,
    pub antenna_connected: Option<bool>,
    pub adc_overflow: Option<u64>,
    /// Raw `all,hf` SNR pair.
    pub snr: Option<String>,
    pub hardware: Option<String>,
    pub freq_offset_hz: Option<f64>,
    pub gps: Option<GpsCoordinates>,
    pub gps_good: Option<u32>,
    pub gps_fixes: Option<u64>,
    pub gps_fixes_per_min: Option<u32>,
    pub gps_fixes_per_hour: Option<u32>,
    pub altitude_m: Option<i32>,
    /// Lines whose value could not be coerced.
    pub issues: Vec<FieldIssue>,
    /// Well-formed lines with a key this parser does not know.
    pub unrecognized: usize,
}

impl StatusReport {
    /// Parse a full `/status` body. Never fails; see [`issues`](Self::issues).
    pub fn parse(body: &str) -> Self {
        let mut report = Self::default();

        for line in body.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            report.apply_line(key.trim(), value.trim());
        }

        for issue in &report.issues {
            debug!(
                key = %issue.key,
                value = %issue.value,
                reason = %issue.reason,
                "skipping unparseable status line"
            );
        }

        report
    }

    /// `true` when no recognized key was present at all.
    pub fn is_empty(&self) -> bool {
        *self
            == Self {
                issues: self.issues.clone(),
                unrecognized: self.unrecognized,
                ..Self::default()
            }
    }

    fn apply_line(&mut self, key: &str, value: &str) {
        let issues = &mut self.issues;
        match key {
            "name" => self.name = Some(value.to_owned()),
            "loc" => self.location = Some(value.to_owned()),
            "sw_version" => self.sw_version = Some(value.to_owned()),
            "antenna" => self.antenna = Some(value.to_owned()),
            "bands" => self.bands = Some(value.to_owned()),
            "status" => self.access = Some(value.to_owned()),
            "op_email" => self.operator_email = Some(value.to_owned()),
            "snr" => self.snr = Some(value.to_owned()),
            "sdr_hw" => self.hardware = Some(value.to_owned()),
            "uptime" => store(&mut self.uptime_seconds, key, value, coerce_int(value), issues),
            "users" => store(&mut self.users, key, value, coerce_int(value), issues),
            "users_max" => store(&mut self.users_max, key, value, coerce_int(value), issues),
            "adc_ov" => store(&mut self.adc_overflow, key, value, coerce_int(value), issues),
            "gps_good" => store(&mut self.gps_good, key, value, coerce_int(value), issues),
            "fixes" => store(&mut self.gps_fixes, key, value, coerce_int(value), issues),
            "fixes_min" => store(
                &mut self.gps_fixes_per_min,
                key,
                value,
                coerce_int(value),
                issues,
            ),
            "fixes_hour" => store(
                &mut self.gps_fixes_per_hour,
                key,
                value,
                coerce_int(value),
                issues,
            ),
            "asl" => store(&mut self.altitude_m, key, value, coerce_int(value), issues),
            "freq_offset" => store(
                &mut self.freq_offset_hz,
                key,
                value,
                coerce_float(value),
                issues,
            ),
            "offline" => store(&mut self.offline, key, value, coerce_flag(value), issues),
            "ant_connected" => store(
                &mut self.antenna_connected,
                key,
                value,
                coerce_flag(value),
                issues,
            ),
            "gps" => store(&mut self.gps, key, value, coerce_coordinates(value), issues),
            _ => self.unrecognized += 1,
        }
    }
}

fn store<T>(
    slot: &mut Option<T>,
    key: &str,
    raw: &str,
    outcome: FieldValue<T>,
    issues: &mut Vec<FieldIssue>,
) {
    match outcome {
        FieldValue::Present(v) => *slot = Some(v),
        FieldValue::Absent => {}
        FieldValue::Invalid(reason) => issues.push(FieldIssue {
            key: key.to_owned(),
            value: raw.to_owned(),
            reason,
        }),
    }
}

// ── Coercions ────────────────────────────────────────────────────────

/// Integer coercion that also accepts integral floats (`"120.0"`).
pub fn coerce_int<T: TryFrom<i64>>(raw: &str) -> FieldValue<T> {
    if raw.is_empty() {
        return FieldValue::Absent;
    }
    let parsed = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .and_then(|f| format!("{f:.0}").parse::<i64>().ok())
    });
    match parsed {
        Some(n) => T::try_from(n).map_or_else(
            |_| FieldValue::Invalid(format!("{n} is out of range")),
            FieldValue::Present,
        ),
        None => FieldValue::Invalid("not an integer".into()),
    }
}

pub fn coerce_float(raw: &str) -> FieldValue<f64> {
    if raw.is_empty() {
        return FieldValue::Absent;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => FieldValue::Present(f),
        _ => FieldValue::Invalid("not a number".into()),
    }
}

/// The device writes booleans as `yes` or `1`; anything else is false.
pub fn coerce_flag(raw: &str) -> FieldValue<bool> {
    if raw.is_empty() {
        return FieldValue::Absent;
    }
    FieldValue::Present(matches!(raw, "yes" | "1"))
}

/// `(lat, lon)` with optional whitespace.
pub fn coerce_coordinates(raw: &str) -> FieldValue<GpsCoordinates> {
    let inner = raw.trim_start_matches('(').trim_end_matches(')').trim();
    if inner.is_empty() {
        return FieldValue::Absent;
    }
    let mut parts = inner.split(',').map(str::trim);
    let (Some(lat), Some(lon)) = (parts.next(), parts.next()) else {
        return FieldValue::Invalid("expected (lat, lon)".into());
    };
    match (lat.parse::<f64>(), lon.parse::<f64>()) {
        (Ok(latitude), Ok(longitude)) => FieldValue::Present(GpsCoordinates {
            latitude,
            longitude,
        }),
        _ => FieldValue::Invalid("coordinates are not numbers".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_scenario() {
        let report = StatusReport::parse("users=3\nusers_max=10\nuptime=120\ngps=(45.0, -93.0)\n");
        assert_eq!(report.users, Some(3));
        assert_eq!(report.users_max, Some(10));
        assert_eq!(report.uptime_seconds, Some(120));
        assert_eq!(
            report.gps,
            Some(GpsCoordinates {
                latitude: 45.0,
                longitude: -93.0
            })
        );
        assert!(report.issues.is_empty());
    }

    #[test]
    fn values_may_contain_spaces_and_equals() {
        let report = StatusReport::parse("name=My Web-888 = rooftop\nloc=Minneapolis, MN\n");
        assert_eq!(report.name.as_deref(), Some("My Web-888 = rooftop"));
        assert_eq!(report.location.as_deref(), Some("Minneapolis, MN"));
    }

    #[test]
    fn bad_line_is_skipped_not_fatal() {
        let report = StatusReport::parse("users=lots\nusers_max=8\n");
        assert_eq!(report.users, None);
        assert_eq!(report.users_max, Some(8));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].key, "users");
        assert_eq!(report.issues[0].value, "lots");
    }

    #[test]
    fn lines_without_equals_are_ignored() {
        let report = StatusReport::parse("garbage line\n\nusers=1\n");
        assert_eq!(report.users, Some(1));
        assert!(report.issues.is_empty());
        assert_eq!(report.unrecognized, 0);
    }

    #[test]
    fn flags_accept_yes_and_one() {
        let report = StatusReport::parse("offline=yes\nant_connected=1\n");
        assert_eq!(report.offline, Some(true));
        assert_eq!(report.antenna_connected, Some(true));

        let report = StatusReport::parse("offline=no\nant_connected=0\n");
        assert_eq!(report.offline, Some(false));
        assert_eq!(report.antenna_connected, Some(false));
    }

    #[test]
    fn malformed_gps_is_an_issue() {
        let report = StatusReport::parse("gps=(45.0)\n");
        assert_eq!(report.gps, None);
        assert_eq!(report.issues.len(), 1);

        let report = StatusReport::parse("gps=(north, west)\n");
        assert_eq!(report.gps, None);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn empty_values_are_absent() {
        let report = StatusReport::parse("fixes_min=\ngps=()\n");
        assert_eq!(report.gps_fixes_per_min, None);
        assert_eq!(report.gps, None);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn integral_floats_coerce_to_ints() {
        assert_eq!(coerce_int::<u64>("120.0"), FieldValue::Present(120));
        assert!(matches!(coerce_int::<u64>("120.5"), FieldValue::Invalid(_)));
        assert!(matches!(coerce_int::<u32>("-1"), FieldValue::Invalid(_)));
        assert_eq!(coerce_int::<i32>("-12"), FieldValue::Present(-12));
    }

    #[test]
    fn full_status_page() {
        let body = "status=active\noffline=no\nname=Web-888 KC0XYZ\nsdr_hw=KiwiSDR v2024.1130\n\
                    op_email=op@example.com\nbands=0-30000000\nusers=2\nusers_max=13\n\
                    loc=Minneapolis\nsw_version=KiwiSDR_v1.700\nantenna=Mini-Whip\n\
                    snr=24,23\nant_connected=1\nadc_ov=4\nuptime=86400\ngps_good=7\n\
                    fixes=12345\nfixes_min=6\nfixes_hour=360\ntdoa_id=\ntdoa_ch=-1\n\
                    asl=256\nfreq_offset=-1.234\ngps=(44.97, -93.26)\n";
        let report = StatusReport::parse(body);
        assert_eq!(report.access.as_deref(), Some("active"));
        assert_eq!(report.hardware.as_deref(), Some("KiwiSDR v2024.1130"));
        assert_eq!(report.gps_fixes_per_hour, Some(360));
        assert_eq!(report.altitude_m, Some(256));
        assert_eq!(report.freq_offset_hz, Some(-1.234));
        assert_eq!(report.unrecognized, 2);
        assert!(report.issues.is_empty());
        assert!(!report.is_empty());
    }

    #[test]
    fn report_with_only_unknown_keys_is_empty() {
        let report = StatusReport::parse("foo=1\nbar=2\n");
        assert!(report.is_empty());
        assert_eq!(report.unrecognized, 2);
    }
}
