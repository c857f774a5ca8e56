// ── System stats (WebSocket only) ──

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_temp_c: f64,
    pub cpu_freq_mhz: f64,
    /// Per-core percentages.
    pub cpu_user_pct: Vec<f64>,
    pub cpu_sys_pct: Vec<f64>,
    pub cpu_idle_pct: Vec<f64>,
    pub audio_kbps: f64,
    pub waterfall_kbps: f64,
    pub http_kbps: f64,
    pub dropped: u64,
    pub underruns: u64,
    pub sequence_errors: u64,
    pub realtime_errors: u64,
}

impl SystemStats {
    /// Mean user CPU across cores; `None` before the first stats frame.
    pub fn cpu_usage_avg(&self) -> Option<f64> {
        let cores = u32::try_from(self.cpu_user_pct.len()).ok().filter(|n| *n > 0)?;
        Some(self.cpu_user_pct.iter().sum::<f64>() / f64::from(cores))
    }

    pub fn total_kbps(&self) -> f64 {
        self.audio_kbps + self.waterfall_kbps + self.http_kbps
    }

    pub fn is_overheating(&self, threshold_c: f64) -> bool {
        self.cpu_temp_c >= threshold_c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_average() {
        let stats = SystemStats {
            cpu_user_pct: vec![10.0, 30.0],
            ..SystemStats::default()
        };
        assert_eq!(stats.cpu_usage_avg(), Some(20.0));
        assert_eq!(SystemStats::default().cpu_usage_avg(), None);
    }

    #[test]
    fn bandwidth_total_and_thermal() {
        let stats = SystemStats {
            audio_kbps: 12.5,
            waterfall_kbps: 40.0,
            http_kbps: 2.5,
            cpu_temp_c: 70.0,
            ..SystemStats::default()
        };
        assert!((stats.total_kbps() - 55.0).abs() < f64::EPSILON);
        assert!(stats.is_overheating(70.0));
        assert!(!stats.is_overheating(75.0));
    }
}
