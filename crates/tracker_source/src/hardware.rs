//! Hardware tracker source
//!
//! Implements `SensorSource` over the opaque [`TrackerSdk`] driver boundary.
//! Configuration tables are owned `Vec`s whose lifetime is scope-bound; they
//! are dropped on `stop_transmit` instead of manually released.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use contracts::{Point3, ScanError, SensorId, SensorSource};

use crate::sdk::{SdkSensorConfig, SdkTransmitterConfig, TrackerSdk, VALID_STATUS};

#[derive(Default)]
struct HardwareState {
    sensors: Vec<SdkSensorConfig>,
    transmitters: Vec<SdkTransmitterConfig>,
    configured: bool,
    selected: Option<i16>,
}

/// Real tracker backend, generic over the vendor SDK.
pub struct HardwareSource<S: TrackerSdk> {
    sdk: S,
    state: Mutex<HardwareState>,
}

impl<S: TrackerSdk> HardwareSource<S> {
    pub fn new(sdk: S) -> Self {
        Self {
            sdk,
            state: Mutex::new(HardwareState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HardwareState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fault(&self, code: i32) -> ScanError {
        ScanError::hardware_fault(self.sdk.decode_error(code))
    }
}

impl<S: TrackerSdk> SensorSource for HardwareSource<S> {
    fn init(&self) -> Result<(), ScanError> {
        self.sdk.init_system().map_err(|code| self.fault(code))?;
        info!("tracker system initialized");
        Ok(())
    }

    fn configure(&self) -> Result<(), ScanError> {
        let system = self.sdk.system_config().map_err(|code| self.fault(code))?;

        let mut sensors = Vec::with_capacity(system.sensor_count);
        for index in 0..system.sensor_count {
            sensors.push(
                self.sdk
                    .sensor_config(index)
                    .map_err(|code| self.fault(code))?,
            );
        }

        let mut transmitters = Vec::with_capacity(system.transmitter_count);
        for index in 0..system.transmitter_count {
            transmitters.push(
                self.sdk
                    .transmitter_config(index)
                    .map_err(|code| self.fault(code))?,
            );
        }

        debug!(
            sensors = sensors.len(),
            transmitters = transmitters.len(),
            "tracker configuration loaded"
        );

        let mut state = self.lock();
        state.sensors = sensors;
        state.transmitters = transmitters;
        state.configured = true;
        Ok(())
    }

    fn attach_transmitter(&self) -> Result<(), ScanError> {
        let attached_index = {
            let state = self.lock();
            if !state.configured {
                return Err(ScanError::configuration(
                    "tracker configuration not loaded",
                ));
            }
            state
                .transmitters
                .iter()
                .position(|transmitter| transmitter.attached)
        };

        // No attached transmitter is reported, not silently ignored.
        let index = attached_index
            .ok_or_else(|| ScanError::configuration("no attached transmitter found"))?;

        self.sdk
            .select_transmitter(index as i16)
            .map_err(|code| self.fault(code))?;

        self.lock().selected = Some(index as i16);
        info!(transmitter = index, "transmitter selected");
        Ok(())
    }

    fn sensor_count(&self) -> Result<usize, ScanError> {
        let state = self.lock();
        if !state.configured {
            return Err(ScanError::configuration("sensor configuration unavailable"));
        }
        Ok(state.sensors.len())
    }

    fn read_record(&self, sensor: SensorId) -> Result<Point3, ScanError> {
        let count = self.sensor_count()?;
        if sensor.as_u32() == 0 || sensor.as_u32() as usize > count {
            return Err(ScanError::SensorRange { sensor, count });
        }

        let record = self
            .sdk
            .read_record(sensor.as_u32() as u16)
            .map_err(|code| self.fault(code))?;

        // Only report the data if the status flag is okay.
        if self.sdk.sensor_status(sensor.as_u32() as u16) != VALID_STATUS {
            return Err(ScanError::InvalidRecord { sensor });
        }

        Ok(Point3::new(
            record.x,
            record.y,
            record.z,
            record.azimuth,
            record.elevation,
            record.roll,
        ))
    }

    fn resolve_serial(&self, serial: SensorId) -> Result<SensorId, ScanError> {
        let state = self.lock();
        if !state.configured {
            return Err(ScanError::configuration("sensor configuration unavailable"));
        }
        state
            .sensors
            .iter()
            .position(|sensor| sensor.attached && sensor.serial_number == serial.as_u32())
            .map(|index| SensorId::new(index as u32 + 1))
            .ok_or(ScanError::SensorNotFound { serial })
    }

    fn stop_transmit(&self) -> Result<(), ScanError> {
        self.sdk
            .select_transmitter(-1)
            .map_err(|code| self.fault(code))?;

        let mut state = self.lock();
        if state.selected.take().is_none() {
            warn!("stop_transmit called with no transmitter selected");
        }
        state.sensors.clear();
        state.transmitters.clear();
        state.configured = false;
        Ok(())
    }

    fn is_mock(&self) -> bool {
        false
    }
}
