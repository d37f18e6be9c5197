//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Unit Model
//! - Positions are millimeters in the transmitter frame (f64)
//! - Orientation angles (azimuth, elevation, roll) are degrees throughout

mod error;
mod exporter;
mod observer;
mod point;
mod profile;
mod prompt;
mod reference;
mod scan;
mod scan_id;
mod sensor_id;
mod sensor_source;

pub use error::*;
pub use exporter::*;
pub use observer::{CalibratedObserver, RawObserver};
pub use point::Point3;
pub use profile::*;
pub use prompt::*;
pub use reference::ReferencePoint;
pub use scan::*;
pub use scan_id::ScanId;
pub use sensor_id::SensorId;
pub use sensor_source::SensorSource;
