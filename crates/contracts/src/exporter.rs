//! Exporter trait - file output interface
//!
//! The engine selects the raw or calibrated buffer per caller flag and hands
//! it to the exporter verbatim; formatting lives entirely behind this trait.

use std::path::Path;

use crate::{Point3, ScanError};

/// Point buffer export trait
///
/// All exporter implementations must implement this trait.
#[trait_variant::make(Exporter: Send)]
pub trait LocalExporter {
    /// Write the buffer as a tabular file (position + orientation columns).
    ///
    /// # Errors
    /// Returns an export error (should include context)
    async fn export_table(&mut self, points: &[Point3], path: &Path) -> Result<(), ScanError>;

    /// Write the buffer as a point cloud (positions only).
    async fn export_point_cloud(&mut self, points: &[Point3], path: &Path)
        -> Result<(), ScanError>;
}
