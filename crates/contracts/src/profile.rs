//! ScanProfile - on-disk scan configuration document
//!
//! Parsed by `config_loader` from TOML or JSON. Sections: `[tracker]`
//! (backend selection), `[scan]` (sensor layout and cadence),
//! `[calibration]` (point count), `[[exports]]` (output routing).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{BufferKind, ScanConfig, SensorId, DEFAULT_SAMPLE_RATE_HZ};

/// Complete scan profile document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanProfile {
    /// Tracker backend settings
    #[serde(default)]
    pub tracker: TrackerSettings,

    /// Scan session layout
    #[serde(default)]
    pub scan: ScanSettings,

    /// Calibration workflow settings
    #[serde(default)]
    pub calibration: CalibrationSettings,

    /// Export routing entries
    #[serde(default)]
    pub exports: Vec<ExportRoute>,
}

/// Tracker backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerSettings {
    /// Use the synthetic data source instead of hardware
    #[serde(default = "default_true")]
    pub mock: bool,

    /// Mock generator seed; 0 selects OS entropy
    #[serde(default)]
    pub mock_seed: u64,

    /// Bounded timeout for calibration threshold waits, seconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            mock: true,
            mock_seed: 0,
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

/// Scan session layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSettings {
    /// Sensors sampled each tick, in tick order
    #[serde(default = "default_used_sensors")]
    pub used_sensors: Vec<u32>,

    /// Reference sensor anchoring the calibration frame
    #[serde(default = "default_reference_sensor")]
    pub reference_sensor: Option<u32>,

    /// Ids above are serial numbers requiring resolution (hardware only)
    #[serde(default)]
    pub ids_are_serials: bool,

    /// Sampling cadence in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            used_sensors: default_used_sensors(),
            reference_sensor: default_reference_sensor(),
            ids_are_serials: false,
            sample_rate_hz: default_sample_rate(),
        }
    }
}

impl ScanSettings {
    /// Convert into the engine's session configuration.
    pub fn to_scan_config(&self) -> ScanConfig {
        ScanConfig {
            used_sensors: self.used_sensors.iter().copied().map(SensorId::new).collect(),
            reference_sensor: self.reference_sensor.map(SensorId::new),
            ids_are_serials: self.ids_are_serials,
            sample_rate_hz: self.sample_rate_hz,
        }
    }
}

/// Calibration workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationSettings {
    /// Number of reference points to capture before a full run
    #[serde(default = "default_calibration_points")]
    pub points: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            points: default_calibration_points(),
        }
    }
}

/// One export routing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportRoute {
    /// Output format
    pub kind: ExportKind,

    /// Which session buffer to export
    pub buffer: BufferKind,

    /// Destination file path
    pub path: PathBuf,
}

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// CSV table, one point per row
    Csv,
    /// ASCII PLY point cloud
    PointCloud,
}

fn default_true() -> bool {
    true
}

fn default_wait_timeout() -> f64 {
    5.0
}

fn default_used_sensors() -> Vec<u32> {
    vec![1, 2, 3]
}

fn default_reference_sensor() -> Option<u32> {
    Some(4)
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE_HZ
}

fn default_calibration_points() -> usize {
    3
}
