//! Engine metrics via the `metrics` facade.
//!
//! No exporter is wired in here; without an installed recorder every call
//! compiles to a no-op.

use std::time::Duration;

use metrics::{counter, histogram};

/// Record one completed acquisition tick.
pub fn record_tick(samples_read: usize, read_latency: Duration) {
    counter!("kinescan_ticks_total").increment(1);
    counter!("kinescan_samples_read_total").increment(samples_read as u64);
    histogram!("kinescan_tick_read_latency_ms").record(read_latency.as_secs_f64() * 1000.0);
}

/// Record a sensor-source fault that aborted a run.
pub fn record_sensor_fault() {
    counter!("kinescan_sensor_faults_total").increment(1);
}

/// Record a scan run starting.
pub fn record_scan_started(acquisition_only: bool) {
    let mode = if acquisition_only {
        "acquisition_only"
    } else {
        "full"
    };
    counter!("kinescan_scans_started_total", "mode" => mode).increment(1);
}

/// Record a scan run stopping.
pub fn record_scan_stopped() {
    counter!("kinescan_scans_stopped_total").increment(1);
}

/// Record how long a calibration threshold wait took.
pub fn record_calibration_wait(waited: Duration) {
    histogram!("kinescan_calibration_wait_ms").record(waited.as_secs_f64() * 1000.0);
}
