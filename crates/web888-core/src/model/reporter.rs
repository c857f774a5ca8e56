// ── Spot reporter identity (WebSocket only) ──

use serde::{Deserialize, Serialize};

/// Identity the device uses for its own automated spotting.
///
/// Two slots: the legacy WSPR identity and the primary FT8 identity. The
/// primary falls back to the legacy value when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub wspr_callsign: String,
    pub wspr_grid: String,
    pub ft8_callsign: String,
    pub ft8_grid: String,
    /// FT8 SNR adjustment applied before reporting.
    pub snr_correction: i32,
    /// FT8 time adjustment applied before reporting.
    pub dt_correction: i32,
    /// WSPR autorun band code per channel (0 = off).
    pub wspr_autorun: Vec<u32>,
    /// FT8 autorun band code per channel (0 = off).
    pub ft8_autorun: Vec<u32>,
}

impl ReporterConfig {
    pub fn callsign(&self) -> &str {
        if self.ft8_callsign.is_empty() {
            &self.wspr_callsign
        } else {
            &self.ft8_callsign
        }
    }

    pub fn grid(&self) -> &str {
        if self.ft8_grid.is_empty() {
            &self.wspr_grid
        } else {
            &self.ft8_grid
        }
    }

    pub fn active_wspr_slots(&self) -> usize {
        self.wspr_autorun.iter().filter(|b| **b > 0).count()
    }

    pub fn active_ft8_slots(&self) -> usize {
        self.ft8_autorun.iter().filter(|b| **b > 0).count()
    }
}
