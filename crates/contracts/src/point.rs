//! Point3 - one tracker sample
//!
//! Position plus orientation as reported by a single sensor, or a derived
//! 3D point produced by the calibration transform.

use serde::{Deserialize, Serialize};

/// One sensor reading: position (mm) plus orientation (degrees).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Rotation about the Z axis, degrees
    pub azimuth: f64,
    /// Rotation about the Y axis, degrees
    pub elevation: f64,
    /// Rotation about the X axis, degrees
    pub roll: f64,
}

impl Point3 {
    /// Create a full position + orientation sample.
    pub fn new(x: f64, y: f64, z: f64, azimuth: f64, elevation: f64, roll: f64) -> Self {
        Self {
            x,
            y,
            z,
            azimuth,
            elevation,
            roll,
        }
    }

    /// Create a pure position point (zero orientation).
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    /// Euclidean distance between the position components of two points.
    pub fn position_distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
