//! SensorId - runtime sensor address
//!
//! Runtime sensor addresses are 1-based (1..=sensor_count). In a profile
//! flagged `ids_are_serials` the raw values are hardware serial numbers
//! awaiting resolution through [`crate::SensorSource::resolve_serial`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one sensor, either a runtime address or an unresolved serial.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SensorId(u32);

impl SensorId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Zero-based index for addressing SDK configuration tables.
    ///
    /// Returns `None` for id 0, which is never a valid runtime address.
    #[inline]
    pub fn to_index(self) -> Option<usize> {
        (self.0 > 0).then(|| (self.0 - 1) as usize)
    }
}

impl From<u32> for SensorId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
