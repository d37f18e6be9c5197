//! Observer callback types
//!
//! Observers are invoked synchronously from the acquisition loop after each
//! tick with the newly produced batch. A slow observer directly delays the
//! next tick, so observer bodies must stay fast or offload their own work.

use std::sync::Arc;

use crate::Point3;

/// Callback receiving the raw samples of one tick (one per used sensor).
pub type RawObserver = Arc<dyn Fn(&[Point3]) + Send + Sync>;

/// Callback receiving the calibrated points of one tick.
pub type CalibratedObserver = Arc<dyn Fn(&[Point3]) + Send + Sync>;
