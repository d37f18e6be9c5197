//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ScanProfile;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Profile info for JSON output
#[derive(Serialize)]
struct ProfileInfo {
    tracker: TrackerInfo,
    scan: ScanInfo,
    calibration_points: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exports: Vec<ExportInfo>,
}

#[derive(Serialize)]
struct TrackerInfo {
    mock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    mock_seed: Option<u64>,
    wait_timeout_secs: f64,
}

#[derive(Serialize)]
struct ScanInfo {
    used_sensors: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_sensor: Option<u32>,
    ids_are_serials: bool,
    sample_rate_hz: f64,
}

#[derive(Serialize)]
struct ExportInfo {
    kind: String,
    buffer: String,
    path: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading profile info");

    if !args.config.exists() {
        return Err(CliError::profile_not_found(args.config.display().to_string()).into());
    }

    let profile = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load profile from {}", args.config.display()))?;

    if args.json {
        let info = build_profile_info(&profile, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize profile info")?;
        println!("{}", json);
    } else {
        print_profile_info(&profile, args);
    }

    Ok(())
}

fn build_profile_info(profile: &ScanProfile, args: &InfoArgs) -> ProfileInfo {
    let exports = if args.exports {
        profile
            .exports
            .iter()
            .map(|route| ExportInfo {
                kind: format!("{:?}", route.kind),
                buffer: format!("{:?}", route.buffer),
                path: route.path.display().to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ProfileInfo {
        tracker: TrackerInfo {
            mock: profile.tracker.mock,
            mock_seed: profile.tracker.mock.then_some(profile.tracker.mock_seed),
            wait_timeout_secs: profile.tracker.wait_timeout_secs,
        },
        scan: ScanInfo {
            used_sensors: profile.scan.used_sensors.clone(),
            reference_sensor: profile.scan.reference_sensor,
            ids_are_serials: profile.scan.ids_are_serials,
            sample_rate_hz: profile.scan.sample_rate_hz,
        },
        calibration_points: profile.calibration.points,
        exports,
    }
}

fn print_profile_info(profile: &ScanProfile, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Kinescan Scan Profile                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🔌 Tracker");
    if profile.tracker.mock {
        println!("   ├─ Source: mock");
        println!("   ├─ Seed: {}", profile.tracker.mock_seed);
    } else {
        println!("   ├─ Source: hardware");
    }
    println!("   └─ Wait timeout: {}s", profile.tracker.wait_timeout_secs);

    println!("\n📡 Scan");
    println!("   ├─ Used sensors: {:?}", profile.scan.used_sensors);
    match profile.scan.reference_sensor {
        Some(id) => println!("   ├─ Reference sensor: {}", id),
        None => println!("   ├─ Reference sensor: (none)"),
    }
    println!(
        "   ├─ Addressing: {}",
        if profile.scan.ids_are_serials {
            "serial numbers"
        } else {
            "port indices"
        }
    );
    println!("   └─ Sample rate: {} Hz", profile.scan.sample_rate_hz);

    println!("\n🎯 Calibration");
    println!("   └─ Points: {}", profile.calibration.points);

    if !profile.exports.is_empty() {
        println!("\n📤 Exports ({})", profile.exports.len());
        for (i, route) in profile.exports.iter().enumerate() {
            let is_last = i == profile.exports.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.exports {
                println!(
                    "   {} {:?} ({:?}) -> {}",
                    prefix,
                    route.kind,
                    route.buffer,
                    route.path.display()
                );
            } else {
                println!("   {} {:?}", prefix, route.kind);
            }
        }
    }

    println!();
}
