//! `calibrate` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CalibrateArgs;
use crate::error::CliError;
use crate::prompt::{AutoPrompt, StdinPrompt};

use super::{build_registry, load_profile};

/// Execute the `calibrate` command
pub async fn run_calibrate(args: &CalibrateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scan profile");

    let profile = load_profile(&args.config)?;
    let mut registry = build_registry(&profile)?;
    registry
        .new_scan(Some(profile.scan.to_scan_config()))
        .map_err(CliError::Scan)?;

    let count = args.points.unwrap_or(profile.calibration.points);
    info!(points = count, "Starting calibration");

    let captured = if args.auto_capture {
        registry
            .calibrate_reference_points(count, &mut AutoPrompt)
            .await
    } else {
        registry
            .calibrate_reference_points(count, &mut StdinPrompt::new())
            .await
    }
    .map_err(CliError::Scan)?;

    println!("\nCaptured {} reference points:", captured.len());
    for point in &captured {
        println!(
            "  {}: pos ({:.2}, {:.2}, {:.2})  ref ({:.2}, {:.2}, {:.2})",
            point.index + 1,
            point.pos.x,
            point.pos.y,
            point.pos.z,
            point.ref_sensor_pos.x,
            point.ref_sensor_pos.y,
            point.ref_sensor_pos.z
        );
    }

    if let Some(ref path) = args.output {
        let json =
            serde_json::to_string_pretty(&captured).context("Failed to serialize reference set")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write reference set to {}", path.display()))?;
        info!(path = %path.display(), "Reference set saved");
        println!("\nReference set written to {}", path.display());
    }

    registry.shutdown().await.map_err(CliError::Scan)?;
    Ok(())
}
