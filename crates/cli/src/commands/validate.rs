//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ScanProfile;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ProfileSummary>,
}

#[derive(Serialize)]
struct ProfileSummary {
    mock: bool,
    sensor_count: usize,
    reference_sensor: Option<u32>,
    sample_rate_hz: f64,
    calibration_points: usize,
    export_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating scan profile");

    let result = validate_profile(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Profile validation failed")
    }
}

fn validate_profile(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(profile) => {
            let warnings = collect_warnings(&profile);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ProfileSummary {
                    mock: profile.tracker.mock,
                    sensor_count: profile.scan.used_sensors.len(),
                    reference_sensor: profile.scan.reference_sensor,
                    sample_rate_hz: profile.scan.sample_rate_hz,
                    calibration_points: profile.calibration.points,
                    export_count: profile.exports.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect profile warnings (non-fatal issues)
fn collect_warnings(profile: &ScanProfile) -> Vec<String> {
    let mut warnings = Vec::new();

    if profile.exports.is_empty() {
        warnings.push("No exports configured - scan data is discarded on exit".to_string());
    }

    if profile.scan.reference_sensor.is_none() {
        warnings
            .push("No reference sensor configured - calibration cannot capture points".to_string());
    }

    if profile.calibration.points == 0 {
        warnings.push(
            "calibration.points is 0 - a full scan needs a saved reference set".to_string(),
        );
    }

    if !profile.tracker.mock {
        warnings.push(
            "Hardware profile - this binary only ships the mock tracker".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Profile is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Mock tracker: {}", summary.mock);
            println!("  Used sensors: {}", summary.sensor_count);
            match summary.reference_sensor {
                Some(id) => println!("  Reference sensor: {}", id),
                None => println!("  Reference sensor: (none)"),
            }
            println!("  Sample rate: {} Hz", summary.sample_rate_hz);
            println!("  Calibration points: {}", summary.calibration_points);
            println!("  Exports: {}", summary.export_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Profile is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
