//! Unified error type for the scan engine
//!
//! One tagged kind per failure class; sensor-source errors propagate through
//! the session and registry unchanged, with no local retry or recovery.

use thiserror::Error;

use crate::{ScanId, SensorId};

/// Unified error type
#[derive(Debug, Error)]
pub enum ScanError {
    // ===== Sensor source errors =====
    /// Hardware configuration missing or invalid
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Hardware fault, carrying the decoded SDK error text
    #[error("hardware fault: {message}")]
    HardwareFault { message: String },

    /// Sensor id outside the configured range
    #[error("sensor id {sensor} out of range (1..={count})")]
    SensorRange { sensor: SensorId, count: usize },

    /// Per-sensor status flag rejected the last record
    #[error("no valid record for sensor {sensor}")]
    InvalidRecord { sensor: SensorId },

    /// Serial number could not be resolved to a runtime sensor id
    #[error("no sensor with serial number {serial}")]
    SensorNotFound { serial: SensorId },

    // ===== Scan state errors =====
    /// Session may not start a full run without reference points
    #[error("cannot start scan {id} without reference points set")]
    MissingReferences { id: ScanId },

    /// Addressed session does not exist
    #[error("scan id {id} not found")]
    ScanNotFound { id: ScanId },

    /// Registry has no sessions to address
    #[error("no scans left")]
    NoScansLeft,

    /// An acquisition loop is already active (single-active-loop invariant)
    #[error("scan {id} is already running")]
    AlreadyRunning { id: ScanId },

    // ===== Calibration errors =====
    /// Calibration requested with a zero point count
    #[error("no reference points requested")]
    NoReferencePoints,

    /// Threshold wait did not complete within the bounded timeout
    #[error("calibration timed out after {waited_ms}ms waiting for samples")]
    CalibrationTimeout { waited_ms: u64 },

    // ===== Export errors =====
    /// Export failed or no data was available
    #[error("export error: {message}")]
    Export { message: String },

    // ===== General errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a hardware fault from decoded SDK error text
    pub fn hardware_fault(message: impl Into<String>) -> Self {
        Self::HardwareFault {
            message: message.into(),
        }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }
}
