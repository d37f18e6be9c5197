//! # Scan Engine
//!
//! Scan-session lifecycle and the concurrent sampling loop.
//!
//! - [`ScanSession`]: owns one acquisition run, holding buffers, reference set,
//!   observer callbacks, run/stop state machine
//! - [`ScanRegistry`]: owns the collection of sessions, id allocation,
//!   calibration workflows, and callback fan-out

mod metrics;
mod registry;
mod session;

pub use registry::ScanRegistry;
pub use session::ScanSession;
