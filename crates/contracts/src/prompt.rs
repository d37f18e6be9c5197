//! CapturePrompt trait - interactive confirmation boundary
//!
//! Calibration workflows consume an opaque "proceed" signal from an external
//! collaborator; the engine never implements input parsing itself.

use crate::{ReferencePoint, ScanError};

/// Interactive calibration confirmation trait.
///
/// The CLI implements this over stdin/stdout; tests implement it as an
/// immediate pass-through.
#[trait_variant::make(CapturePrompt: Send)]
pub trait LocalCapturePrompt {
    /// Block until the operator confirms capture of the point at `index`.
    async fn confirm_capture(&mut self, index: usize) -> Result<(), ScanError>;

    /// Report a freshly captured reference point back to the operator.
    fn point_captured(&mut self, point: &ReferencePoint);
}
