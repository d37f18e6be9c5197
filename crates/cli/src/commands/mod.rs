//! Command implementations.

mod calibrate;
mod info;
mod run;
mod validate;

pub use calibrate::run_calibrate;
pub use info::run_info;
pub use run::run_scan;
pub use validate::run_validate;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{ScanProfile, SensorSource};
use scan_engine::ScanRegistry;
use tracker_source::MockSource;

use crate::error::CliError;

/// Load a scan profile, mapping a missing file to a dedicated error.
fn load_profile(path: &Path) -> Result<ScanProfile> {
    if !path.exists() {
        return Err(CliError::profile_not_found(path.display().to_string()).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load profile from {}", path.display()))
}

/// Build the sensor source named by the profile.
///
/// Only the mock tracker ships with this binary; hardware profiles need the
/// vendor runtime and are rejected up front.
fn build_source(profile: &ScanProfile) -> Result<Arc<dyn SensorSource>> {
    if profile.tracker.mock {
        Ok(Arc::new(MockSource::new(profile.tracker.mock_seed)))
    } else {
        Err(CliError::tracker_unavailable(
            "hardware tracker support requires the vendor SDK runtime; \
             set tracker.mock = true to use the simulated source",
        )
        .into())
    }
}

/// Construct and initialize a registry over the profile's source.
fn build_registry(profile: &ScanProfile) -> Result<ScanRegistry> {
    let source = build_source(profile)?;
    let registry = ScanRegistry::new(source)
        .with_wait_timeout(Duration::from_secs_f64(profile.tracker.wait_timeout_secs));
    registry.initialize().map_err(CliError::Scan)?;
    Ok(registry)
}
