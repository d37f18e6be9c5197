//! Profile validation.
//!
//! Rules:
//! - used sensor ids non-empty and unique
//! - reference sensor not also listed as used
//! - serial-number ids only outside mock mode
//! - sample_rate_hz > 0
//! - wait_timeout_secs > 0
//! - export paths non-empty

use std::collections::HashSet;

use contracts::{ScanError, ScanProfile};

/// Validate a scan profile.
///
/// Returns the first violation encountered, or `Ok(())`.
pub fn validate(profile: &ScanProfile) -> Result<(), ScanError> {
    validate_sensors(profile)?;
    validate_tracker(profile)?;
    validate_rates(profile)?;
    validate_exports(profile)?;
    Ok(())
}

fn validate_sensors(profile: &ScanProfile) -> Result<(), ScanError> {
    let scan = &profile.scan;
    if scan.used_sensors.is_empty() {
        return Err(ScanError::configuration(
            "scan.used_sensors: at least one sensor is required",
        ));
    }

    let mut seen = HashSet::new();
    for sensor in &scan.used_sensors {
        if !seen.insert(sensor) {
            return Err(ScanError::configuration(format!(
                "scan.used_sensors: duplicate sensor id {sensor}"
            )));
        }
    }

    if let Some(reference) = scan.reference_sensor {
        if scan.used_sensors.contains(&reference) {
            return Err(ScanError::configuration(format!(
                "scan.reference_sensor: sensor {reference} is also listed in used_sensors"
            )));
        }
    }
    Ok(())
}

fn validate_tracker(profile: &ScanProfile) -> Result<(), ScanError> {
    if profile.scan.ids_are_serials && profile.tracker.mock {
        return Err(ScanError::configuration(
            "scan.ids_are_serials: serial resolution is not available in mock mode",
        ));
    }
    Ok(())
}

fn validate_rates(profile: &ScanProfile) -> Result<(), ScanError> {
    if profile.scan.sample_rate_hz <= 0.0 {
        return Err(ScanError::configuration(format!(
            "scan.sample_rate_hz: must be > 0, got {}",
            profile.scan.sample_rate_hz
        )));
    }
    if profile.tracker.wait_timeout_secs <= 0.0 {
        return Err(ScanError::configuration(format!(
            "tracker.wait_timeout_secs: must be > 0, got {}",
            profile.tracker.wait_timeout_secs
        )));
    }
    Ok(())
}

fn validate_exports(profile: &ScanProfile) -> Result<(), ScanError> {
    for (idx, route) in profile.exports.iter().enumerate() {
        if route.path.as_os_str().is_empty() {
            return Err(ScanError::configuration(format!(
                "exports[{idx}].path: cannot be empty"
            )));
        }
    }
    Ok(())
}
