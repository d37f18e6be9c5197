//! # Tracker Source
//!
//! `SensorSource` implementations over the electromagnetic tracker.
//!
//! - [`MockSource`]: seeded random-walk generator, hardware-free
//! - [`HardwareSource`]: real backend, generic over the opaque
//!   [`TrackerSdk`] driver boundary

mod hardware;
mod mock;
mod sdk;

pub use hardware::HardwareSource;
pub use mock::MockSource;
pub use sdk::{
    SdkCode, SdkRecord, SdkSensorConfig, SdkSystemConfig, SdkTransmitterConfig, TrackerSdk,
    SDK_SUCCESS, VALID_STATUS,
};
