//! ReferencePoint - calibrated anatomical landmark
//!
//! Derived from two simultaneous finger-sensor readings and the reference
//! sensor's pose at capture time.

use serde::{Deserialize, Serialize};

use crate::Point3;

/// One calibrated reference point within a scan session's reference set.
///
/// Indices are contiguous `0..N-1` within one session's set, in insertion
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Sequence position within the reference set
    pub index: usize,

    /// Calibrated offset, expressed in the canonical (zero-orientation) frame
    pub pos: Point3,

    /// Uncalibrated reference-sensor sample at capture time
    pub ref_sensor_pos: Point3,
}

impl ReferencePoint {
    pub fn new(index: usize, pos: Point3, ref_sensor_pos: Point3) -> Self {
        Self {
            index,
            pos,
            ref_sensor_pos,
        }
    }
}
