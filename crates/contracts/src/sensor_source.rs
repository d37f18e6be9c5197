//! SensorSource trait - tracker backend abstraction
//!
//! Defines a unified interface over the hardware driver and the mock
//! generator, decoupling the scan engine from the concrete backend.

use crate::{Point3, ScanError, SensorId};

/// Tracker data source trait
///
/// Abstracts the common behavior of the real electromagnetic tracker and the
/// mock random-walk generator. All methods take `&self`; implementations use
/// interior mutability so a single source can be shared across the registry
/// and the acquisition loop.
///
/// # Design Principles
///
/// 1. **Decoupling**: the engine never sees SDK mechanics, only records
/// 2. **Unified Interface**: mock and real backends use the same API
/// 3. **Uniform Errors**: every failure surfaces as a [`ScanError`], with
///    hardware faults carrying the decoded SDK error text
pub trait SensorSource: Send + Sync {
    /// Open the tracker system.
    ///
    /// The mock backend seeds its generator and otherwise no-ops.
    fn init(&self) -> Result<(), ScanError>;

    /// Enumerate sensor and transmitter hardware configuration.
    fn configure(&self) -> Result<(), ScanError>;

    /// Select the first transmitter flagged as attached.
    fn attach_transmitter(&self) -> Result<(), ScanError>;

    /// Number of sensors the configured system exposes.
    ///
    /// Fails with a configuration error if [`configure`](Self::configure)
    /// was never called on the real backend. The mock backend reports a
    /// fixed count of 4.
    fn sensor_count(&self) -> Result<usize, ScanError>;

    /// Read one position + orientation record from the given sensor.
    ///
    /// Runtime sensor ids are 1-based; out-of-range ids are rejected with
    /// `SensorRange` and records whose status flag is not valid with
    /// `InvalidRecord`.
    fn read_record(&self, sensor: SensorId) -> Result<Point3, ScanError>;

    /// Map a hardware serial number to a runtime sensor id.
    ///
    /// The mock backend never resolves; serials pass through unchanged.
    fn resolve_serial(&self, serial: SensorId) -> Result<SensorId, ScanError>;

    /// Deselect the active transmitter and release configuration resources.
    fn stop_transmit(&self) -> Result<(), ScanError>;

    /// Whether this source produces synthetic data.
    ///
    /// Fixed at construction; the registry consults it to decide whether
    /// serial resolution runs.
    fn is_mock(&self) -> bool;
}
