// ── GPS ──

use serde::{Deserialize, Serialize};

/// One tracked satellite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    /// Receiver tracking channel.
    pub channel: u32,
    /// Constellation code (`N`, `G`, `B`, ...).
    pub system: String,
    pub prn: u32,
    pub snr: i32,
    pub rssi: i32,
    pub azimuth: i32,
    pub elevation: i32,
    pub in_solution: bool,
}

/// Receiver-side GPS counters only the stats stream carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsReceiver {
    pub acquiring: bool,
    pub tracking: u32,
    pub adc_clock_mhz: f64,
    /// Maidenhead locator derived by the device.
    pub grid: String,
}

/// GPS state. The scalar fields come from either surface; `receiver` and
/// `satellites` stay `None` outside WebSocket mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsStatus {
    pub good: Option<u32>,
    pub fixes: Option<u64>,
    pub fixes_per_min: Option<u32>,
    pub fixes_per_hour: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<i32>,
    pub receiver: Option<GpsReceiver>,
    pub satellites: Option<Vec<Satellite>>,
}

impl GpsStatus {
    /// Locked once the receiver has produced any fix.
    pub fn has_lock(&self) -> Option<bool> {
        self.fixes.map(|f| f > 0)
    }

    pub fn satellite_summary(&self) -> Option<SatelliteSummary> {
        self.satellites.as_deref().map(SatelliteSummary::from_satellites)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSummary {
    pub tracked: usize,
    pub in_solution: usize,
    /// `None` when nothing is tracked.
    pub mean_snr: Option<f64>,
}

impl SatelliteSummary {
    pub fn from_satellites(satellites: &[Satellite]) -> Self {
        let mean_snr = u32::try_from(satellites.len())
            .ok()
            .filter(|n| *n > 0)
            .map(|n| {
                let total: f64 = satellites.iter().map(|s| f64::from(s.snr)).sum();
                total / f64::from(n)
            });
        Self {
            tracked: satellites.len(),
            in_solution: satellites.iter().filter(|s| s.in_solution).count(),
            mean_snr,
        }
    }
}
