//! # Integration Tests
//!
//! Cross-crate end-to-end tests over the mock tracker.
//!
//! Covers:
//! - Contract defaults
//! - Full acquisition pipeline (calibrate -> scan -> export)
//! - Profile round trips through the config loader

#[cfg(test)]
mod contract_tests {
    use contracts::{ScanConfig, SensorId, DEFAULT_SAMPLE_RATE_HZ};

    #[test]
    fn test_default_scan_config() {
        let config = ScanConfig::default();
        assert_eq!(
            config.used_sensors,
            vec![SensorId::new(1), SensorId::new(2), SensorId::new(3)]
        );
        assert_eq!(config.reference_sensor, Some(SensorId::new(4)));
        assert!(!config.ids_are_serials);
        assert_eq!(config.sample_rate_hz, DEFAULT_SAMPLE_RATE_HZ);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        BufferKind, CapturePrompt, ReferencePoint, ScanConfig, ScanError, SensorId,
    };
    use exporter::FileExporter;
    use scan_engine::ScanRegistry;
    use tracker_source::MockSource;

    /// Prompt double that confirms every capture immediately.
    struct PassPrompt;

    impl CapturePrompt for PassPrompt {
        async fn confirm_capture(&mut self, _index: usize) -> Result<(), ScanError> {
            Ok(())
        }

        fn point_captured(&mut self, _point: &ReferencePoint) {}
    }

    fn registry_with_seed(seed: u64) -> ScanRegistry {
        let registry = ScanRegistry::new(Arc::new(MockSource::new(seed)))
            .with_wait_timeout(Duration::from_secs(2));
        registry.initialize().unwrap();
        registry
    }

    fn fast_config() -> ScanConfig {
        ScanConfig {
            sample_rate_hz: 200.0,
            ..ScanConfig::default()
        }
    }

    /// End-to-end: calibrate, run a scan, verify both buffers fill coherently.
    #[tokio::test]
    async fn test_e2e_calibrate_then_scan() {
        let mut registry = registry_with_seed(7);
        registry.new_scan(Some(fast_config())).unwrap();

        let captured = registry
            .calibrate_reference_points(3, &mut PassPrompt)
            .await
            .unwrap();
        assert_eq!(captured.len(), 3);
        let indices: Vec<_> = captured.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        // Calibration runs are acquisition-only: buffers stay empty.
        let session = registry.session(None).unwrap();
        assert!(session.buffer(BufferKind::Raw).is_empty());
        assert_eq!(session.references().len(), 3);

        registry.start_scan(None).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        registry.stop_scan(None).await.unwrap();

        let session = registry.session(None).unwrap();
        let raw = session.buffer(BufferKind::Raw);
        let calibrated = session.buffer(BufferKind::Calibrated);
        let used = session.used_sensor_count();

        assert!(!raw.is_empty());
        // Raw grows one batch of used sensors per tick; calibrated one sample
        // per tick.
        assert_eq!(raw.len() % used, 0);
        assert_eq!(calibrated.len(), raw.len() / used);

        let levels = session.levels_snapshot();
        assert_eq!(levels.raw_samples, raw.len());
        assert_eq!(levels.reference_samples, raw.len() / used);
    }

    /// A full run without any reference set is rejected before acquisition
    /// starts.
    #[tokio::test]
    async fn test_scan_requires_reference_set() {
        let mut registry = registry_with_seed(3);
        let id = registry.new_scan(Some(fast_config())).unwrap();

        assert!(matches!(
            registry.start_scan(None),
            Err(ScanError::MissingReferences { .. })
        ));
        assert_eq!(registry.session(Some(id)).unwrap().references().len(), 0);
    }

    /// A reference set captured on one session can seed another without
    /// re-calibrating.
    #[tokio::test]
    async fn test_reference_set_reuse() {
        let mut registry = registry_with_seed(11);
        registry.new_scan(Some(fast_config())).unwrap();
        let captured = registry
            .calibrate_reference_points(2, &mut PassPrompt)
            .await
            .unwrap();

        let second = registry.new_scan(Some(fast_config())).unwrap();
        registry
            .set_reference_points(captured.clone(), Some(second))
            .unwrap();
        assert_eq!(
            registry.session(Some(second)).unwrap().references(),
            captured
        );

        registry.start_scan(Some(second)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        registry.stop_scan(Some(second)).await.unwrap();

        let calibrated = registry
            .session(Some(second))
            .unwrap()
            .buffer(BufferKind::Calibrated);
        assert!(!calibrated.is_empty());
    }

    /// End-to-end export: run a scan, write both formats, verify on disk.
    #[tokio::test]
    async fn test_e2e_export_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("scan.csv");
        let ply_path = dir.path().join("scan.ply");

        let mut registry = registry_with_seed(5);
        registry.new_scan(Some(fast_config())).unwrap();
        registry
            .calibrate_reference_points(1, &mut PassPrompt)
            .await
            .unwrap();

        let mut exporter = FileExporter::new();

        // Nothing acquired yet: export reports uniformly instead of writing
        // an empty file.
        assert!(matches!(
            registry
                .export_table(&mut exporter, BufferKind::Raw, &csv_path, None)
                .await,
            Err(ScanError::Export { .. })
        ));

        registry.start_scan(None).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        registry.stop_scan(None).await.unwrap();

        registry
            .export_table(&mut exporter, BufferKind::Raw, &csv_path, None)
            .await
            .unwrap();
        registry
            .export_point_cloud(&mut exporter, BufferKind::Calibrated, &ply_path, None)
            .await
            .unwrap();

        let raw_len = registry
            .session(None)
            .unwrap()
            .buffer(BufferKind::Raw)
            .len();
        let calibrated_len = registry
            .session(None)
            .unwrap()
            .buffer(BufferKind::Calibrated)
            .len();

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("x,y,z,azimuth,elevation,roll"));
        assert_eq!(lines.count(), raw_len);

        let ply = std::fs::read_to_string(&ply_path).unwrap();
        let mut lines = ply.lines();
        assert_eq!(lines.next(), Some("ply"));
        assert_eq!(lines.next(), Some("format ascii 1.0"));
        assert_eq!(
            lines.next(),
            Some(format!("element vertex {}", calibrated_len).as_str())
        );

        registry.shutdown().await.unwrap();
    }

    /// Serial resolution is exercised on non-mock sources only; a serial
    /// config against the mock passes sensor ids through untouched.
    #[tokio::test]
    async fn test_serial_config_passthrough_on_mock() {
        let mut registry = registry_with_seed(1);
        let config = ScanConfig {
            used_sensors: vec![SensorId::new(1), SensorId::new(2)],
            reference_sensor: Some(SensorId::new(4)),
            ids_are_serials: true,
            sample_rate_hz: 200.0,
        };
        let id = registry.new_scan(Some(config)).unwrap();
        let session = registry.session(Some(id)).unwrap();
        assert_eq!(
            session.config().used_sensors,
            vec![SensorId::new(1), SensorId::new(2)]
        );
    }
}

#[cfg(test)]
mod profile_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BufferKind, ExportKind, SensorId};

    const PROFILE: &str = r#"
        [tracker]
        mock = true
        mock_seed = 7
        wait_timeout_secs = 2.0

        [scan]
        used_sensors = [1, 2, 3]
        reference_sensor = 4
        sample_rate_hz = 100.0

        [calibration]
        points = 3

        [[exports]]
        kind = "csv"
        buffer = "raw"
        path = "out/raw.csv"

        [[exports]]
        kind = "point_cloud"
        buffer = "calibrated"
        path = "out/surface.ply"
    "#;

    #[test]
    fn test_profile_to_scan_config() {
        let profile = ConfigLoader::load_from_str(PROFILE, ConfigFormat::Toml).unwrap();
        let config = profile.scan.to_scan_config();

        assert_eq!(
            config.used_sensors,
            vec![SensorId::new(1), SensorId::new(2), SensorId::new(3)]
        );
        assert_eq!(config.reference_sensor, Some(SensorId::new(4)));
        assert_eq!(config.sample_rate_hz, 100.0);

        assert_eq!(profile.exports.len(), 2);
        assert_eq!(profile.exports[0].kind, ExportKind::Csv);
        assert_eq!(profile.exports[0].buffer, BufferKind::Raw);
        assert_eq!(profile.exports[1].kind, ExportKind::PointCloud);
        assert_eq!(profile.exports[1].buffer, BufferKind::Calibrated);
    }

    #[test]
    fn test_profile_round_trip() {
        let profile = ConfigLoader::load_from_str(PROFILE, ConfigFormat::Toml).unwrap();
        let toml = ConfigLoader::to_toml(&profile).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        assert_eq!(reloaded.scan.used_sensors, profile.scan.used_sensors);
        assert_eq!(reloaded.calibration.points, profile.calibration.points);
        assert_eq!(reloaded.exports.len(), profile.exports.len());
    }
}
