//! ScanSession - one acquisition run
//!
//! State machine: `Idle → Running → Stopped`, with `AcquisitionOnly`
//! entered instead of `Running` for temporary calibration runs whose data
//! is discarded on stop.
//!
//! Buffers are written only by the acquisition task and read concurrently
//! by calibration logic, the exporter, and observers. The buffer lock is a
//! std `RwLock` and is never held across an await point.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, trace, warn};

use contracts::{
    BufferKind, BufferLevels, CalibratedObserver, Point3, RawObserver, ReferencePoint, RunState,
    ScanConfig, ScanError, ScanId, SensorSource,
};

use crate::metrics;

#[derive(Default)]
struct BufferInner {
    /// Raw samples, one per used sensor per tick, chronological
    raw: Vec<Point3>,
    /// Reference-sensor poses, one per tick
    reference_samples: Vec<Point3>,
    /// Calibrated output points
    output: Vec<Point3>,
    /// Calibrated reference set
    references: Vec<ReferencePoint>,
}

struct SharedBuffers {
    inner: RwLock<BufferInner>,
}

impl SharedBuffers {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BufferInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BufferInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

struct ObserverSlots {
    raw: Mutex<Option<RawObserver>>,
    calibrated: Mutex<Option<CalibratedObserver>>,
}

/// Handle to the spawned acquisition task of the current run.
struct Worker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), ScanError>>,
    /// Buffer lengths at run start, for acquisition-only rollback
    raw_mark: usize,
    ref_mark: usize,
    out_mark: usize,
}

/// One scan session: buffers, reference set, observers, run state.
///
/// Created exclusively by [`crate::ScanRegistry`].
pub struct ScanSession {
    id: ScanId,
    config: ScanConfig,
    source: Arc<dyn SensorSource>,
    buffers: Arc<SharedBuffers>,
    observers: Arc<ObserverSlots>,
    levels_rx: watch::Receiver<BufferLevels>,
    state: RunState,
    worker: Option<Worker>,
    last_acquisition_only: bool,
}

impl ScanSession {
    pub(crate) fn new(id: ScanId, config: ScanConfig, source: Arc<dyn SensorSource>) -> Self {
        let (_, levels_rx) = watch::channel(BufferLevels::default());
        Self {
            id,
            config,
            source,
            buffers: Arc::new(SharedBuffers {
                inner: RwLock::new(BufferInner::default()),
            }),
            observers: Arc::new(ObserverSlots {
                raw: Mutex::new(None),
                calibrated: Mutex::new(None),
            }),
            levels_rx,
            state: RunState::Idle,
            worker: None,
            last_acquisition_only: false,
        }
    }

    pub fn id(&self) -> ScanId {
        self.id
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Number of sensors read each tick (excludes the reference sensor).
    pub fn used_sensor_count(&self) -> usize {
        self.config.used_sensor_count()
    }

    /// Whether the most recent/active run was acquisition-only.
    pub fn is_acquisition_only(&self) -> bool {
        self.last_acquisition_only
    }

    /// Start the acquisition loop.
    ///
    /// Control returns immediately; sampling continues on a spawned task at
    /// the configured cadence. A non-acquisition-only run requires at least
    /// one reference point.
    pub fn start(&mut self, acquisition_only: bool) -> Result<(), ScanError> {
        if self.state.is_running() {
            return Err(ScanError::AlreadyRunning { id: self.id });
        }
        // Sessions can be built from arbitrary configs, not just validated
        // profiles; a bad rate must fail here, not panic the worker.
        if !self.config.sample_rate_hz.is_finite() || self.config.sample_rate_hz <= 0.0 {
            return Err(ScanError::configuration(format!(
                "sample_rate_hz must be positive and finite, got {}",
                self.config.sample_rate_hz
            )));
        }
        if !acquisition_only && self.buffers.read().references.is_empty() {
            return Err(ScanError::MissingReferences { id: self.id });
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (levels_tx, levels_rx) = watch::channel(self.levels_snapshot());
        self.levels_rx = levels_rx;

        let (raw_mark, ref_mark, out_mark) = {
            let inner = self.buffers.read();
            (
                inner.raw.len(),
                inner.reference_samples.len(),
                inner.output.len(),
            )
        };

        let loop_ctx = AcquisitionLoop {
            id: self.id,
            config: self.config.clone(),
            source: Arc::clone(&self.source),
            buffers: Arc::clone(&self.buffers),
            observers: Arc::clone(&self.observers),
            levels_tx,
            acquisition_only,
        };
        let handle = tokio::spawn(loop_ctx.run(stop_rx));

        self.worker = Some(Worker {
            stop_tx,
            handle,
            raw_mark,
            ref_mark,
            out_mark,
        });
        self.state = if acquisition_only {
            RunState::AcquisitionOnly
        } else {
            RunState::Running
        };
        self.last_acquisition_only = acquisition_only;

        metrics::record_scan_started(acquisition_only);
        debug!(
            scan = %self.id,
            acquisition_only,
            sample_rate_hz = self.config.sample_rate_hz,
            "scan started"
        );
        Ok(())
    }

    /// Halt the acquisition loop.
    ///
    /// Returns only after the worker task has terminated, so no buffer
    /// writes occur after this call. With `acquisition_only` the buffers
    /// accumulated during this run are discarded. A fault that aborted the
    /// run mid-way surfaces here.
    pub async fn stop(&mut self, acquisition_only: bool) -> Result<(), ScanError> {
        let Some(worker) = self.worker.take() else {
            self.state = RunState::Stopped;
            return Ok(());
        };

        // Send may fail if the worker already aborted; the join below still
        // collects its result.
        let _ = worker.stop_tx.send(true);
        let result = match worker.handle.await {
            Ok(result) => result,
            Err(join_err) => Err(ScanError::hardware_fault(format!(
                "acquisition worker failed: {join_err}"
            ))),
        };
        self.state = RunState::Stopped;

        if acquisition_only {
            let mut inner = self.buffers.write();
            inner.raw.truncate(worker.raw_mark);
            inner.reference_samples.truncate(worker.ref_mark);
            inner.output.truncate(worker.out_mark);
        }

        metrics::record_scan_stopped();
        debug!(scan = %self.id, acquisition_only, "scan stopped");
        result
    }

    /// Append a reference point with the next sequential index.
    ///
    /// Returns the assigned index.
    pub fn add_reference(&self, pos: Point3, ref_sensor_pos: Point3) -> usize {
        let mut inner = self.buffers.write();
        let index = inner.references.len();
        inner
            .references
            .push(ReferencePoint::new(index, pos, ref_sensor_pos));
        index
    }

    /// Append a reference point keeping the caller-supplied index.
    pub fn add_reference_at(&self, point: ReferencePoint) {
        self.buffers.write().references.push(point);
    }

    /// Replace the whole reference set, clearing any existing one first.
    pub fn set_references(&self, points: Vec<ReferencePoint>) {
        let mut inner = self.buffers.write();
        inner.references.clear();
        inner.references.extend(points);
    }

    /// Clear the reference set.
    pub fn reset_references(&self) {
        self.buffers.write().references.clear();
    }

    /// Snapshot of the reference set.
    pub fn references(&self) -> Vec<ReferencePoint> {
        self.buffers.read().references.clone()
    }

    /// Snapshot of the selected buffer.
    ///
    /// Stable only after [`stop`](Self::stop) has returned.
    pub fn buffer(&self, kind: BufferKind) -> Vec<Point3> {
        let inner = self.buffers.read();
        match kind {
            BufferKind::Raw => inner.raw.clone(),
            BufferKind::Calibrated => inner.output.clone(),
        }
    }

    /// Snapshots of the raw and calibrated buffers, for the exporter.
    pub fn dump_data(&self) -> (Vec<Point3>, Vec<Point3>) {
        let inner = self.buffers.read();
        (inner.raw.clone(), inner.output.clone())
    }

    /// Current buffer fill levels.
    pub fn levels_snapshot(&self) -> BufferLevels {
        let inner = self.buffers.read();
        BufferLevels {
            raw_samples: inner.raw.len(),
            reference_samples: inner.reference_samples.len(),
        }
    }

    /// Buffer levels at the start of the current run, or the current
    /// snapshot when no run is active.
    ///
    /// Threshold waits measure against this baseline so data retained from
    /// an earlier run never satisfies them.
    pub fn run_start_levels(&self) -> BufferLevels {
        match &self.worker {
            Some(worker) => BufferLevels {
                raw_samples: worker.raw_mark,
                reference_samples: worker.ref_mark,
            },
            None => self.levels_snapshot(),
        }
    }

    /// Subscribe to buffer levels published after every tick of the current
    /// run.
    pub fn levels(&self) -> watch::Receiver<BufferLevels> {
        self.levels_rx.clone()
    }

    /// The two most recent finger samples and the latest reference-sensor
    /// sample, if a full tick batch is available.
    pub fn calibration_inputs(&self) -> Option<(Point3, Point3, Point3)> {
        let inner = self.buffers.read();
        let per_tick = self.config.used_sensor_count();
        if per_tick < 2 || inner.raw.len() < per_tick {
            return None;
        }
        let batch_start = inner.raw.len() - per_tick;
        let finger_a = inner.raw[batch_start];
        let finger_b = inner.raw[batch_start + 1];
        let ref_sensor = *inner.reference_samples.last()?;
        Some((finger_a, finger_b, ref_sensor))
    }

    /// Replace the raw observer.
    pub fn register_raw_observer(&self, observer: RawObserver) {
        *self.observers.raw.lock().unwrap_or_else(|e| e.into_inner()) = Some(observer);
    }

    /// Replace the calibrated observer.
    pub fn register_calibrated_observer(&self, observer: CalibratedObserver) {
        *self
            .observers
            .calibrated
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(observer);
    }
}

/// Everything the spawned acquisition task needs, detached from the session.
struct AcquisitionLoop {
    id: ScanId,
    config: ScanConfig,
    source: Arc<dyn SensorSource>,
    buffers: Arc<SharedBuffers>,
    observers: Arc<ObserverSlots>,
    levels_tx: watch::Sender<BufferLevels>,
    acquisition_only: bool,
}

impl AcquisitionLoop {
    async fn run(self, mut stop_rx: watch::Receiver<bool>) -> Result<(), ScanError> {
        // Extreme rates round down to zero, which interval() rejects.
        let period = Duration::from_secs_f64(1.0 / self.config.sample_rate_hz)
            .max(Duration::from_nanos(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self.tick() {
                metrics::record_sensor_fault();
                error!(scan = %self.id, error = %e, "sensor fault, aborting run");
                return Err(e);
            }
        }

        trace!(scan = %self.id, "acquisition loop terminated");
        Ok(())
    }

    /// One sampling tick: read every configured sensor, append, calibrate,
    /// publish levels, notify observers.
    fn tick(&self) -> Result<(), ScanError> {
        let read_start = Instant::now();

        let mut batch = Vec::with_capacity(self.config.used_sensor_count());
        for &sensor in &self.config.used_sensors {
            batch.push(self.source.read_record(sensor)?);
        }
        let ref_sample = match self.config.reference_sensor {
            Some(sensor) => Some(self.source.read_record(sensor)?),
            None => None,
        };
        let read_latency = read_start.elapsed();

        let (levels, calibrated) = {
            let mut inner = self.buffers.write();
            inner.raw.extend_from_slice(&batch);
            if let Some(sample) = ref_sample {
                inner.reference_samples.push(sample);
            }

            let calibrated = if !self.acquisition_only && batch.len() >= 2 {
                ref_sample.and_then(|sample| {
                    calibration::calibrated_sample(&batch[0], &batch[1], &sample, &inner.references)
                })
            } else {
                None
            };
            if let Some(point) = calibrated {
                inner.output.push(point);
            }

            (
                BufferLevels {
                    raw_samples: inner.raw.len(),
                    reference_samples: inner.reference_samples.len(),
                },
                calibrated,
            )
        };

        self.levels_tx.send_replace(levels);
        metrics::record_tick(batch.len() + ref_sample.is_some() as usize, read_latency);

        // Observers run synchronously on this task; a slow observer delays
        // the next tick.
        if let Some(observer) = self
            .observers
            .raw
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            observer(&batch);
        }
        if let Some(point) = calibrated {
            if let Some(observer) = self
                .observers
                .calibrated
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .as_ref()
            {
                observer(&[point]);
            }
        }

        trace!(
            scan = %self.id,
            raw_samples = levels.raw_samples,
            reference_samples = levels.reference_samples,
            "tick complete"
        );
        Ok(())
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // Deleting a session removes it and its buffers entirely; a still
        // running worker is told to stop and will observe the closed channel.
        if let Some(worker) = self.worker.take() {
            warn!(scan = %self.id, "session dropped while running, signaling worker");
            let _ = worker.stop_tx.send(true);
            worker.handle.abort();
        }
    }
}
