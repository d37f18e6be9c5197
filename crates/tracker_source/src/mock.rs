//! Mock tracker source
//!
//! Implements `SensorSource` with a seeded random walk, enabling testing
//! and development without physical sensors.

use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use contracts::{Point3, ScanError, SensorId, SensorSource};

/// Fixed sensor count the mock system reports.
const MOCK_SENSOR_COUNT: usize = 4;

/// Radius of the first sample, on the x-axis.
const START_RADIUS: f64 = 100.0;

/// Half-range of the per-axis perturbation applied each step.
const STEP_RANGE: f64 = 5.0;

struct MockState {
    rng: SmallRng,
    prev: Option<Point3>,
}

/// Hardware-free tracker source producing a bounded random walk.
///
/// The first record is a fixed point on the x-axis at radius 100; every
/// subsequent record perturbs the previous one by symmetric noise within
/// ±5 units per axis. All sensors share one walk, matching the device-free
/// behavior the engine expects during calibration rehearsal.
pub struct MockSource {
    seed: u64,
    state: Mutex<MockState>,
}

impl MockSource {
    /// Create a mock source.
    ///
    /// If `seed` is 0, uses OS entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible sequences.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            state: Mutex::new(MockState {
                rng: Self::make_rng(seed),
                prev: None,
            }),
        }
    }

    fn make_rng(seed: u64) -> SmallRng {
        if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // Mock state is plain data; a poisoned lock only means a panicking
        // test already failed.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SensorSource for MockSource {
    fn init(&self) -> Result<(), ScanError> {
        // Reseed so repeated init() from a fixed seed replays the same walk.
        let mut state = self.lock();
        state.rng = Self::make_rng(self.seed);
        state.prev = None;
        debug!(seed = self.seed, "mock tracker source initialized");
        Ok(())
    }

    fn configure(&self) -> Result<(), ScanError> {
        Ok(())
    }

    fn attach_transmitter(&self) -> Result<(), ScanError> {
        Ok(())
    }

    fn sensor_count(&self) -> Result<usize, ScanError> {
        Ok(MOCK_SENSOR_COUNT)
    }

    fn read_record(&self, _sensor: SensorId) -> Result<Point3, ScanError> {
        let mut state = self.lock();
        let next = match state.prev {
            None => Point3::from_position(START_RADIUS, 0.0, 0.0),
            Some(prev) => {
                let dx = state.rng.gen_range(-STEP_RANGE..STEP_RANGE);
                let dy = state.rng.gen_range(-STEP_RANGE..STEP_RANGE);
                let dz = state.rng.gen_range(-STEP_RANGE..STEP_RANGE);
                Point3::from_position(prev.x + dx, prev.y + dy, prev.z + dz)
            }
        };
        state.prev = Some(next);
        Ok(next)
    }

    fn resolve_serial(&self, serial: SensorId) -> Result<SensorId, ScanError> {
        // Mock mode never resolves; serials pass through unchanged.
        Ok(serial)
    }

    fn stop_transmit(&self) -> Result<(), ScanError> {
        Ok(())
    }

    fn is_mock(&self) -> bool {
        true
    }
}
