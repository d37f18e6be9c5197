//! TrackerSdk trait - opaque vendor driver boundary
//!
//! Mirrors the narrow slice of the tracker SDK the engine needs: system
//! init, configuration queries, transmitter selection, asynchronous record
//! reads, per-sensor status, and error-code decoding. A vendor FFI binding
//! would implement this trait; unit tests drive [`crate::HardwareSource`]
//! with a scripted in-crate fake instead.

/// Raw SDK return code.
pub type SdkCode = i32;

/// Code reported by the SDK on success.
pub const SDK_SUCCESS: SdkCode = 0;

/// Per-sensor status value meaning the last record is valid.
pub const VALID_STATUS: u32 = 0;

/// System-level configuration reported by the SDK.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkSystemConfig {
    pub sensor_count: usize,
    pub transmitter_count: usize,
}

/// Per-sensor configuration entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkSensorConfig {
    pub serial_number: u32,
    pub attached: bool,
}

/// Per-transmitter configuration entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkTransmitterConfig {
    pub serial_number: u32,
    pub attached: bool,
}

/// One position + orientation record as the SDK reports it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub azimuth: f64,
    pub elevation: f64,
    pub roll: f64,
}

/// Narrow driver interface over the vendor SDK.
///
/// Methods return `Err(code)` on non-success return codes; the caller turns
/// the code into a hardware fault via [`decode_error`](Self::decode_error).
pub trait TrackerSdk: Send + Sync {
    /// Initialize the tracker system.
    fn init_system(&self) -> Result<(), SdkCode>;

    /// Query system-level configuration.
    fn system_config(&self) -> Result<SdkSystemConfig, SdkCode>;

    /// Query configuration of the sensor at the given zero-based index.
    fn sensor_config(&self, index: usize) -> Result<SdkSensorConfig, SdkCode>;

    /// Query configuration of the transmitter at the given zero-based index.
    fn transmitter_config(&self, index: usize) -> Result<SdkTransmitterConfig, SdkCode>;

    /// Select the transmitter at the given index; `-1` deselects.
    fn select_transmitter(&self, index: i16) -> Result<(), SdkCode>;

    /// Issue an asynchronous record read for the given 1-based sensor id.
    fn read_record(&self, sensor: u16) -> Result<SdkRecord, SdkCode>;

    /// Status flag of the last record for the given 1-based sensor id.
    fn sensor_status(&self, sensor: u16) -> u32;

    /// Decode an SDK return code into human-readable text.
    ///
    /// Code 0 must decode to an explicit "no error" sentinel, never an
    /// undefined value.
    fn decode_error(&self, code: SdkCode) -> String;
}
