//! Scan session data model: configuration, run state, buffer addressing.

use serde::{Deserialize, Serialize};

use crate::SensorId;

/// Default sampling cadence when a profile does not override it.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 50.0;

/// Configuration of one scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Sensors sampled each tick, in tick order. The first two form the
    /// "finger" pair used by the calibration transform.
    pub used_sensors: Vec<SensorId>,

    /// Sensor whose pose anchors the reference frame, if any
    pub reference_sensor: Option<SensorId>,

    /// Ids above are hardware serial numbers and need resolution before use
    pub ids_are_serials: bool,

    /// Sampling cadence of the acquisition loop
    pub sample_rate_hz: f64,
}

impl ScanConfig {
    /// Number of sensors read each tick (excludes the reference sensor).
    pub fn used_sensor_count(&self) -> usize {
        self.used_sensors.len()
    }
}

impl Default for ScanConfig {
    /// Mock-mode default: finger/used sensors 1..3, reference sensor 4.
    fn default() -> Self {
        Self {
            used_sensors: vec![SensorId::new(1), SensorId::new(2), SensorId::new(3)],
            reference_sensor: Some(SensorId::new(4)),
            ids_are_serials: false,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

/// Run state of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created, never run
    #[default]
    Idle,
    /// Acquisition loop active, output buffer being produced
    Running,
    /// Acquisition loop active for calibration only; data discarded on stop
    AcquisitionOnly,
    /// Loop terminated; buffers are a stable snapshot
    Stopped,
}

impl RunState {
    /// Whether an acquisition loop is currently active.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::AcquisitionOnly)
    }
}

/// Which session buffer an export or observer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    /// Chronological raw samples, one per used sensor per tick
    Raw,
    /// Calibrated output points, at most one per tick
    Calibrated,
}

/// Buffer fill levels published by the acquisition loop after every tick.
///
/// Calibration threshold waits subscribe to these instead of polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferLevels {
    /// Raw buffer length (samples, all sensors interleaved)
    pub raw_samples: usize,
    /// Reference-sensor sample buffer length
    pub reference_samples: usize,
}
