//! ScanRegistry - session collection, id allocation, calibration workflows
//!
//! Constructed explicitly with an injected sensor source; there is no
//! process-wide singleton. Addressing is by explicit id, with `None`
//! targeting the tracked active scan.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use contracts::{
    BufferKind, BufferLevels, CalibratedObserver, CapturePrompt, Exporter, RawObserver,
    ReferencePoint, ScanConfig, ScanError, ScanId, SensorSource,
};

use crate::metrics;
use crate::session::ScanSession;

const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a buffer-level threshold wait.
enum WaitOutcome {
    Ready,
    WorkerGone,
    TimedOut(Duration),
}

/// Registry of scan sessions over one sensor source.
pub struct ScanRegistry {
    source: Arc<dyn SensorSource>,
    sessions: Vec<ScanSession>,
    active: Option<ScanId>,
    raw_observer: Option<RawObserver>,
    calibrated_observer: Option<CalibratedObserver>,
    wait_timeout: Duration,
}

impl ScanRegistry {
    /// Create a registry over the given source.
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        Self {
            source,
            sessions: Vec::new(),
            active: None,
            raw_observer: None,
            calibrated_observer: None,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// Override the bounded timeout applied to calibration threshold waits.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Drive the source through init, configuration and transmitter attach.
    pub fn initialize(&self) -> Result<(), ScanError> {
        self.source.init()?;
        self.source.configure()?;
        self.source.attach_transmitter()?;
        info!(mock = self.source.is_mock(), "tracker source ready");
        Ok(())
    }

    /// Create a new scan session and make it the active scan.
    ///
    /// The new id is the smallest non-negative integer not currently
    /// assigned. Outside mock mode a config flagged `ids_are_serials` has
    /// every sensor id (and the optional reference sensor id) resolved
    /// through the source first.
    pub fn new_scan(&mut self, config: Option<ScanConfig>) -> Result<ScanId, ScanError> {
        let config = if self.source.is_mock() {
            // Mock mode skips resolution entirely; config is used as given.
            config.unwrap_or_default()
        } else {
            let mut config = config.unwrap_or_default();
            if config.ids_are_serials {
                for sensor in config.used_sensors.iter_mut() {
                    *sensor = self.source.resolve_serial(*sensor)?;
                }
                if let Some(reference) = config.reference_sensor {
                    config.reference_sensor = Some(self.source.resolve_serial(reference)?);
                }
                config.ids_are_serials = false;
            }
            config
        };

        let id = self.next_id();
        let session = ScanSession::new(id, config, Arc::clone(&self.source));

        // Shared observers are installed on every session created afterward.
        if let Some(observer) = &self.raw_observer {
            session.register_raw_observer(Arc::clone(observer));
        }
        if let Some(observer) = &self.calibrated_observer {
            session.register_calibrated_observer(Arc::clone(observer));
        }

        self.sessions.push(session);
        self.active = Some(id);
        info!(scan = %id, "scan created");
        Ok(id)
    }

    /// Smallest non-negative integer not currently assigned.
    fn next_id(&self) -> ScanId {
        let mut candidate = 0u32;
        while self
            .sessions
            .iter()
            .any(|session| session.id().as_u32() == candidate)
        {
            candidate += 1;
        }
        ScanId::new(candidate)
    }

    /// Remove a session and its buffers entirely.
    ///
    /// `None` targets the active scan. The registry is unchanged on failure.
    /// A running session is stopped before removal.
    pub async fn delete_scan(&mut self, id: Option<ScanId>) -> Result<(), ScanError> {
        let id = match id {
            Some(id) => {
                if !self.sessions.iter().any(|session| session.id() == id) {
                    return Err(ScanError::ScanNotFound { id });
                }
                id
            }
            None => self.active.ok_or(ScanError::NoScansLeft)?,
        };

        let position = self
            .sessions
            .iter()
            .position(|session| session.id() == id)
            .ok_or(ScanError::ScanNotFound { id })?;

        if self.sessions[position].run_state().is_running() {
            self.sessions[position].stop(false).await?;
        }
        self.sessions.remove(position);

        if self.active == Some(id) {
            // Deleting the active scan falls back to the most recently added.
            self.active = self.sessions.last().map(|session| session.id());
        }
        info!(scan = %id, "scan deleted");
        Ok(())
    }

    /// Explicitly select the active scan.
    pub fn select_scan(&mut self, id: ScanId) -> Result<(), ScanError> {
        if !self.sessions.iter().any(|session| session.id() == id) {
            return Err(ScanError::ScanNotFound { id });
        }
        self.active = Some(id);
        Ok(())
    }

    /// Currently active scan id, if any.
    pub fn active_scan(&self) -> Option<ScanId> {
        self.active
    }

    /// All sessions, in insertion order.
    pub fn sessions(&self) -> &[ScanSession] {
        &self.sessions
    }

    /// Borrow a session; `None` targets the active scan.
    pub fn session(&self, id: Option<ScanId>) -> Result<&ScanSession, ScanError> {
        let id = match id {
            Some(id) => id,
            None => self.active.ok_or(ScanError::NoScansLeft)?,
        };
        self.sessions
            .iter()
            .find(|session| session.id() == id)
            .ok_or(ScanError::ScanNotFound { id })
    }

    fn session_mut(&mut self, id: Option<ScanId>) -> Result<&mut ScanSession, ScanError> {
        let id = match id {
            Some(id) => id,
            None => self.active.ok_or(ScanError::NoScansLeft)?,
        };
        self.sessions
            .iter_mut()
            .find(|session| session.id() == id)
            .ok_or(ScanError::ScanNotFound { id })
    }

    /// Start a full (calibrated) run on the addressed session.
    ///
    /// Exactly one acquisition loop may be active system-wide; the shared
    /// observers are installed on the target before starting.
    pub fn start_scan(&mut self, id: Option<ScanId>) -> Result<(), ScanError> {
        self.ensure_no_active_loop()?;
        let raw = self.raw_observer.clone();
        let calibrated = self.calibrated_observer.clone();

        let session = self.session_mut(id)?;
        if let Some(observer) = raw {
            session.register_raw_observer(observer);
        }
        if let Some(observer) = calibrated {
            session.register_calibrated_observer(observer);
        }
        session.start(false)
    }

    /// Stop the addressed session's run.
    pub async fn stop_scan(&mut self, id: Option<ScanId>) -> Result<(), ScanError> {
        self.session_mut(id)?.stop(false).await
    }

    fn ensure_no_active_loop(&self) -> Result<(), ScanError> {
        if let Some(running) = self
            .sessions
            .iter()
            .find(|session| session.run_state().is_running())
        {
            return Err(ScanError::AlreadyRunning { id: running.id() });
        }
        Ok(())
    }

    /// Capture exactly one reference point on the active scan.
    ///
    /// Runs the session acquisition-only, waits (bounded, no busy-poll) for
    /// two full tick batches plus one reference-sensor sample, computes the
    /// point from the two most recent finger samples and the latest
    /// reference pose, appends it with the next index, then discards the
    /// temporary data.
    pub async fn calibrate_single_ref_point(&mut self) -> Result<ReferencePoint, ScanError> {
        self.ensure_no_active_loop()?;
        let timeout = self.wait_timeout;
        let session = self.session_mut(None)?;
        session.start(true)?;

        let point = match wait_for_samples(session, timeout).await {
            WaitOutcome::Ready => {
                let Some((finger_a, finger_b, ref_sensor)) = session.calibration_inputs() else {
                    session.stop(true).await?;
                    return Err(ScanError::configuration(
                        "calibration requires at least two used sensors",
                    ));
                };
                let index = session.references().len();
                let point = calibration::reference_point(index, &finger_a, &finger_b, &ref_sensor);
                session.add_reference_at(point);
                session.stop(true).await?;
                point
            }
            WaitOutcome::WorkerGone => {
                // The loop aborted on a fault; stop surfaces it.
                session.stop(true).await?;
                return Err(ScanError::hardware_fault(
                    "acquisition aborted during calibration",
                ));
            }
            WaitOutcome::TimedOut(waited) => {
                session.stop(true).await?;
                return Err(ScanError::CalibrationTimeout {
                    waited_ms: waited.as_millis() as u64,
                });
            }
        };

        info!(
            index = point.index,
            x = point.pos.x,
            y = point.pos.y,
            z = point.pos.z,
            "reference point calibrated"
        );
        Ok(point)
    }

    /// Interactive calibration collecting `count` reference points on the
    /// active scan.
    ///
    /// Each iteration waits for fresh samples, then awaits the operator's
    /// proceed signal before capturing. Any pre-existing reference set is
    /// reset first; captured points get sequential indices and are reported
    /// back through the prompt.
    pub async fn calibrate_reference_points<P: CapturePrompt>(
        &mut self,
        count: usize,
        prompt: &mut P,
    ) -> Result<Vec<ReferencePoint>, ScanError> {
        if count == 0 {
            return Err(ScanError::NoReferencePoints);
        }
        self.ensure_no_active_loop()?;
        let timeout = self.wait_timeout;

        let session = self.session_mut(None)?;
        if !session.references().is_empty() {
            session.reset_references();
        }
        session.start(true)?;

        let mut captured = Vec::with_capacity(count);
        for index in 0..count {
            match wait_for_samples(session, timeout).await {
                WaitOutcome::Ready => {}
                WaitOutcome::WorkerGone => {
                    session.stop(true).await?;
                    return Err(ScanError::hardware_fault(
                        "acquisition aborted during calibration",
                    ));
                }
                WaitOutcome::TimedOut(waited) => {
                    session.stop(true).await?;
                    return Err(ScanError::CalibrationTimeout {
                        waited_ms: waited.as_millis() as u64,
                    });
                }
            }

            if let Err(e) = prompt.confirm_capture(index).await {
                session.stop(true).await?;
                return Err(e);
            }

            let Some((finger_a, finger_b, ref_sensor)) = session.calibration_inputs() else {
                session.stop(true).await?;
                return Err(ScanError::configuration(
                    "calibration requires at least two used sensors",
                ));
            };
            let point = calibration::reference_point(index, &finger_a, &finger_b, &ref_sensor);
            session.add_reference_at(point);
            prompt.point_captured(&point);
            captured.push(point);
            debug!(index, "calibration point captured");
        }

        session.stop(true).await?;
        info!(points = captured.len(), "calibration complete");
        Ok(captured)
    }

    /// Replace the addressed session's reference set with a previously
    /// captured one.
    pub fn set_reference_points(
        &mut self,
        points: Vec<ReferencePoint>,
        id: Option<ScanId>,
    ) -> Result<(), ScanError> {
        let session = self.session_mut(id)?;
        session.set_references(points);
        Ok(())
    }

    /// Export the selected buffer of the addressed session as a table.
    pub async fn export_table<E: Exporter>(
        &self,
        exporter: &mut E,
        kind: BufferKind,
        path: &Path,
        id: Option<ScanId>,
    ) -> Result<(), ScanError> {
        let points = self.export_buffer(kind, id)?;
        exporter.export_table(&points, path).await
    }

    /// Export the selected buffer of the addressed session as a point cloud.
    pub async fn export_point_cloud<E: Exporter>(
        &self,
        exporter: &mut E,
        kind: BufferKind,
        path: &Path,
        id: Option<ScanId>,
    ) -> Result<(), ScanError> {
        let points = self.export_buffer(kind, id)?;
        exporter.export_point_cloud(&points, path).await
    }

    fn export_buffer(
        &self,
        kind: BufferKind,
        id: Option<ScanId>,
    ) -> Result<Vec<contracts::Point3>, ScanError> {
        let session = self.session(id)?;
        let points = session.buffer(kind);
        if points.is_empty() {
            return Err(ScanError::export("no measurement available for export"));
        }
        Ok(points)
    }

    /// Install a raw observer on every existing and future session.
    pub fn register_raw_observer(&mut self, observer: RawObserver) {
        for session in &self.sessions {
            session.register_raw_observer(Arc::clone(&observer));
        }
        self.raw_observer = Some(observer);
    }

    /// Install a calibrated observer on every existing and future session.
    pub fn register_calibrated_observer(&mut self, observer: CalibratedObserver) {
        for session in &self.sessions {
            session.register_calibrated_observer(Arc::clone(&observer));
        }
        self.calibrated_observer = Some(observer);
    }

    /// Stop any active run and release the transmitter.
    pub async fn shutdown(&mut self) -> Result<(), ScanError> {
        for session in self.sessions.iter_mut() {
            if session.run_state().is_running() {
                let acquisition_only = session.is_acquisition_only();
                if let Err(e) = session.stop(acquisition_only).await {
                    warn!(scan = %session.id(), error = %e, "error stopping scan on shutdown");
                }
            }
        }
        self.source.stop_transmit()
    }
}

/// Await two fresh tick batches and at least one fresh reference sample.
///
/// Thresholds are relative to the current run's start marks, so buffers
/// retained from an earlier full run never satisfy the wait.
async fn wait_for_samples(session: &ScanSession, timeout: Duration) -> WaitOutcome {
    let base = session.run_start_levels();
    let needed_raw = base.raw_samples + 2 * session.used_sensor_count();
    let needed_ref = base.reference_samples + 1;
    let started = Instant::now();
    let mut levels = session.levels();

    let outcome = tokio::time::timeout(timeout, async {
        loop {
            let current: BufferLevels = *levels.borrow();
            if current.raw_samples >= needed_raw && current.reference_samples >= needed_ref {
                return WaitOutcome::Ready;
            }
            if levels.changed().await.is_err() {
                return WaitOutcome::WorkerGone;
            }
        }
    })
    .await
    .unwrap_or(WaitOutcome::TimedOut(started.elapsed()));

    metrics::record_calibration_wait(started.elapsed());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Point3;
    use tracker_source::MockSource;

    fn mock_registry() -> ScanRegistry {
        ScanRegistry::new(Arc::new(MockSource::new(42)))
            .with_wait_timeout(Duration::from_secs(2))
    }

    fn fast_config() -> ScanConfig {
        ScanConfig {
            sample_rate_hz: 200.0,
            ..ScanConfig::default()
        }
    }

    /// Prompt double that confirms immediately.
    struct AutoPrompt {
        reported: Vec<ReferencePoint>,
    }

    impl CapturePrompt for AutoPrompt {
        async fn confirm_capture(&mut self, _index: usize) -> Result<(), ScanError> {
            Ok(())
        }

        fn point_captured(&mut self, point: &ReferencePoint) {
            self.reported.push(*point);
        }
    }

    #[tokio::test]
    async fn test_id_allocation_is_smallest_unused() {
        let mut registry = mock_registry();
        let id0 = registry.new_scan(None).unwrap();
        let id1 = registry.new_scan(None).unwrap();
        let id2 = registry.new_scan(None).unwrap();
        assert_eq!(
            (id0, id1, id2),
            (ScanId::new(0), ScanId::new(1), ScanId::new(2))
        );

        registry.delete_scan(Some(id1)).await.unwrap();
        assert_eq!(registry.new_scan(None).unwrap(), ScanId::new(1));
        assert_eq!(registry.new_scan(None).unwrap(), ScanId::new(3));

        let ids: Vec<_> = registry.sessions().iter().map(|s| s.id()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
    }

    #[tokio::test]
    async fn test_delete_scan_error_paths() {
        let mut registry = mock_registry();
        assert!(matches!(
            registry.delete_scan(None).await,
            Err(ScanError::NoScansLeft)
        ));

        registry.new_scan(None).unwrap();
        assert!(matches!(
            registry.delete_scan(Some(ScanId::new(42))).await,
            Err(ScanError::ScanNotFound { .. })
        ));
        // Registry unchanged on failure.
        assert_eq!(registry.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_active_falls_back_to_most_recent() {
        let mut registry = mock_registry();
        let id0 = registry.new_scan(None).unwrap();
        let id1 = registry.new_scan(None).unwrap();
        assert_eq!(registry.active_scan(), Some(id1));

        registry.delete_scan(None).await.unwrap();
        assert_eq!(registry.active_scan(), Some(id0));

        registry.delete_scan(None).await.unwrap();
        assert_eq!(registry.active_scan(), None);
    }

    #[tokio::test]
    async fn test_session_accessor_reports_uniformly() {
        let mut registry = mock_registry();
        assert!(matches!(
            registry.session(None),
            Err(ScanError::NoScansLeft)
        ));

        let id = registry.new_scan(None).unwrap();
        assert_eq!(registry.session(None).unwrap().id(), id);
        assert!(matches!(
            registry.session(Some(ScanId::new(9))),
            Err(ScanError::ScanNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_scan_requires_references() {
        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();

        let err = registry.start_scan(None).unwrap_err();
        assert!(matches!(err, ScanError::MissingReferences { .. }));

        let session = registry.session(None).unwrap();
        assert_eq!(session.run_state(), contracts::RunState::Idle);
        assert_eq!(session.levels_snapshot().raw_samples, 0);
    }

    #[tokio::test]
    async fn test_calibrate_single_ref_point() {
        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();

        let point = registry.calibrate_single_ref_point().await.unwrap();
        assert_eq!(point.index, 0);

        let session = registry.session(None).unwrap();
        assert_eq!(session.references().len(), 1);
        // Temporary acquisition data was discarded.
        assert_eq!(session.levels_snapshot(), BufferLevels::default());
    }

    #[tokio::test]
    async fn test_calibrate_reference_points_rejects_zero() {
        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();
        let mut prompt = AutoPrompt {
            reported: Vec::new(),
        };
        assert!(matches!(
            registry.calibrate_reference_points(0, &mut prompt).await,
            Err(ScanError::NoReferencePoints)
        ));
    }

    #[tokio::test]
    async fn test_calibrate_reference_points_sequential_indices() {
        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();

        // Pre-existing set is replaced, not appended to.
        registry
            .session(None)
            .unwrap()
            .add_reference(Point3::default(), Point3::default());

        let mut prompt = AutoPrompt {
            reported: Vec::new(),
        };
        let points = registry
            .calibrate_reference_points(3, &mut prompt)
            .await
            .unwrap();

        let indices: Vec<_> = points.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(prompt.reported.len(), 3);
        assert_eq!(registry.session(None).unwrap().references().len(), 3);
    }

    #[tokio::test]
    async fn test_full_run_after_calibration() {
        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();
        registry.calibrate_single_ref_point().await.unwrap();

        registry.start_scan(None).unwrap();

        // A second loop anywhere in the registry is rejected.
        registry.new_scan(Some(fast_config())).unwrap();
        assert!(matches!(
            registry.start_scan(None),
            Err(ScanError::AlreadyRunning { .. })
        ));
        registry.delete_scan(None).await.unwrap();

        let mut levels = registry.session(None).unwrap().levels();
        tokio::time::timeout(Duration::from_secs(2), async {
            while levels.borrow().raw_samples < 6 {
                levels.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        registry.stop_scan(None).await.unwrap();
        let session = registry.session(None).unwrap();
        let (raw, output) = session.dump_data();
        assert!(raw.len() >= 6);
        assert!(!output.is_empty());
    }

    #[tokio::test]
    async fn test_calibration_wait_ignores_retained_data() {
        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();
        registry.calibrate_single_ref_point().await.unwrap();

        // Full run whose buffers are retained after stop.
        registry.start_scan(None).unwrap();
        let mut levels = registry.session(None).unwrap().levels();
        tokio::time::timeout(Duration::from_secs(2), async {
            while levels.borrow().raw_samples < 12 {
                levels.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
        registry.stop_scan(None).await.unwrap();
        let retained = registry.session(None).unwrap().levels_snapshot();
        assert!(retained.raw_samples >= 12);

        // A subsequent acquisition-only wait starts from the retained marks
        // and only completes after fresh ticks.
        let session = registry.session_mut(None).unwrap();
        session.start(true).unwrap();
        assert_eq!(session.run_start_levels(), retained);

        assert!(matches!(
            wait_for_samples(session, Duration::from_secs(2)).await,
            WaitOutcome::Ready
        ));
        let used = session.used_sensor_count();
        let now = session.levels_snapshot();
        assert!(now.raw_samples >= retained.raw_samples + 2 * used);
        assert!(now.reference_samples >= retained.reference_samples + 1);
        session.stop(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_reference_points_replaces_set() {
        let mut registry = mock_registry();
        registry.new_scan(None).unwrap();
        registry
            .session(None)
            .unwrap()
            .add_reference(Point3::default(), Point3::default());

        let preset = vec![
            ReferencePoint::new(0, Point3::from_position(1.0, 0.0, 0.0), Point3::default()),
            ReferencePoint::new(1, Point3::from_position(0.0, 1.0, 0.0), Point3::default()),
        ];
        registry.set_reference_points(preset.clone(), None).unwrap();
        assert_eq!(registry.session(None).unwrap().references(), preset);
    }

    #[tokio::test]
    async fn test_observer_fan_out_covers_existing_and_new_sessions() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut registry = mock_registry();
        registry.new_scan(Some(fast_config())).unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let ticks = Arc::clone(&ticks);
            registry.register_raw_observer(Arc::new(move |_| {
                ticks.fetch_add(1, Ordering::SeqCst);
            }));
        }

        // Existing session got the observer; acquisition-only calibration
        // drives it.
        registry.calibrate_single_ref_point().await.unwrap();
        let after_existing = ticks.load(Ordering::SeqCst);
        assert!(after_existing > 0);

        // A session created afterward gets it too.
        registry.new_scan(Some(fast_config())).unwrap();
        registry.calibrate_single_ref_point().await.unwrap();
        assert!(ticks.load(Ordering::SeqCst) > after_existing);
    }
}
