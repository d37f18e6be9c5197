//! `run` command implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{ExportKind, ReferencePoint, ScanProfile};
use exporter::FileExporter;
use scan_engine::ScanRegistry;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::prompt::{AutoPrompt, StdinPrompt};

use super::{build_registry, load_profile};

/// Raw batches between live-feed lines. Keeps stdout readable at 50 Hz.
const LIVE_FEED_STRIDE: u64 = 25;

/// Execute the `run` command
pub async fn run_scan(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scan profile");

    let profile = load_profile(&args.config)?;

    info!(
        mock = profile.tracker.mock,
        sensors = profile.scan.used_sensors.len(),
        reference = ?profile.scan.reference_sensor,
        sample_rate_hz = profile.scan.sample_rate_hz,
        exports = profile.exports.len(),
        "Profile loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - profile is valid, exiting");
        print_profile_summary(&profile);
        return Ok(());
    }

    let mut registry = build_registry(&profile)?;
    let id = registry
        .new_scan(Some(profile.scan.to_scan_config()))
        .map_err(CliError::Scan)?;
    info!(scan = %id, "Scan session created");

    if args.live {
        install_live_feed(&mut registry);
    }

    // Establish the reference set: load a saved one or calibrate now.
    if let Some(ref path) = args.references {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference set from {}", path.display()))?;
        let points: Vec<ReferencePoint> =
            serde_json::from_str(&data).context("Failed to parse reference set")?;
        info!(points = points.len(), path = %path.display(), "Reusing saved reference set");
        registry
            .set_reference_points(points, None)
            .map_err(CliError::Scan)?;
    } else {
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
        info!(points = captured.len(), "Calibration complete");
    }

    registry.start_scan(None).map_err(CliError::Scan)?;
    info!("Scan running");

    if args.duration == 0 {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping scan...");
    } else {
        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, stopping scan...");
            }
            _ = tokio::time::sleep(Duration::from_secs(args.duration)) => {
                info!(duration_secs = args.duration, "Scan duration reached");
            }
        }
    }

    registry.stop_scan(None).await.map_err(CliError::Scan)?;

    let levels = registry.session(None).map_err(CliError::Scan)?.levels_snapshot();
    info!(
        raw_samples = levels.raw_samples,
        reference_samples = levels.reference_samples,
        "Scan stopped"
    );

    run_exports(&registry, &profile).await?;

    registry.shutdown().await.map_err(CliError::Scan)?;
    info!("Kinescan finished");
    Ok(())
}

/// Run every export route from the profile against the active session.
async fn run_exports(registry: &ScanRegistry, profile: &ScanProfile) -> Result<()> {
    let mut exporter = FileExporter::new();
    for route in &profile.exports {
        info!(
            kind = ?route.kind,
            buffer = ?route.buffer,
            path = %route.path.display(),
            "Exporting"
        );
        match route.kind {
            ExportKind::Csv => registry
                .export_table(&mut exporter, route.buffer, &route.path, None)
                .await
                .map_err(CliError::Scan)?,
            ExportKind::PointCloud => registry
                .export_point_cloud(&mut exporter, route.buffer, &route.path, None)
                .await
                .map_err(CliError::Scan)?,
        }
    }
    Ok(())
}

/// Print a throttled feed of raw batches to stdout.
fn install_live_feed(registry: &mut ScanRegistry) {
    let ticks = Arc::new(AtomicU64::new(0));
    registry.register_raw_observer(Arc::new(move |batch| {
        let n = ticks.fetch_add(1, Ordering::Relaxed);
        if n % LIVE_FEED_STRIDE == 0 {
            if let Some(p) = batch.first() {
                println!(
                    "[{:>8}] sensor 1: ({:8.2}, {:8.2}, {:8.2})  az {:7.2}  el {:7.2}  roll {:7.2}",
                    n, p.x, p.y, p.z, p.azimuth, p.elevation, p.roll
                );
            }
        }
    }));
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print profile summary for dry-run mode
fn print_profile_summary(profile: &ScanProfile) {
    println!("\n=== Profile Summary ===\n");
    println!("Tracker:");
    println!("  Mock: {}", profile.tracker.mock);
    if profile.tracker.mock {
        println!("  Mock seed: {}", profile.tracker.mock_seed);
    }
    println!("  Wait timeout: {}s", profile.tracker.wait_timeout_secs);

    println!("\nScan:");
    println!("  Used sensors: {:?}", profile.scan.used_sensors);
    match profile.scan.reference_sensor {
        Some(id) => println!("  Reference sensor: {}", id),
        None => println!("  Reference sensor: (none)"),
    }
    println!("  Sample rate: {} Hz", profile.scan.sample_rate_hz);
    println!("  Serial addressing: {}", profile.scan.ids_are_serials);

    println!("\nCalibration:");
    println!("  Points: {}", profile.calibration.points);

    if !profile.exports.is_empty() {
        println!("\nExports ({}):", profile.exports.len());
        for route in &profile.exports {
            println!(
                "  - {:?} ({:?}) -> {}",
                route.kind,
                route.buffer,
                route.path.display()
            );
        }
    }

    println!();
}
