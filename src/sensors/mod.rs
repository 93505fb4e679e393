//! Sensor interface surface
//!
//! The registry resolves every sensor type to a `SensorHandle`, the uniform
//! start/stop/report surface over both variants: pull sensors are owned
//! per-request instances, push sensors are shared process-wide singletons.

mod pull;
mod push;

pub use pull::PullSensor;
pub use push::PushSensor;

use std::sync::Arc;

use crate::config::SensorConfig;
use crate::error::SenseError;
use crate::platform::RecordSink;
use crate::types::{SensorKind, SensorType};

/// Uniform handle over a resolved sensor
pub enum SensorHandle {
    Pull(PullSensor),
    Push(Arc<PushSensor>),
}

impl SensorHandle {
    pub fn sensor_type(&self) -> SensorType {
        match self {
            SensorHandle::Pull(sensor) => sensor.sensor_type(),
            SensorHandle::Push(sensor) => sensor.sensor_type(),
        }
    }

    pub fn log_tag(&self) -> &'static str {
        self.sensor_type().log_tag()
    }

    pub fn kind(&self) -> SensorKind {
        self.sensor_type().kind()
    }

    pub fn config(&self) -> SensorConfig {
        match self {
            SensorHandle::Pull(sensor) => sensor.config().clone(),
            SensorHandle::Push(sensor) => sensor.config(),
        }
    }

    /// Begin sensing, emitting records to `sink`
    pub fn start(&mut self, sink: Arc<dyn RecordSink>) -> Result<(), SenseError> {
        match self {
            SensorHandle::Pull(sensor) => sensor.start(sink),
            SensorHandle::Push(sensor) => {
                sensor.start(sink);
                Ok(())
            }
        }
    }

    /// Stop sensing. See the variant methods for the exact guarantees.
    pub fn stop(&mut self) {
        match self {
            SensorHandle::Pull(sensor) => sensor.stop(),
            SensorHandle::Push(sensor) => sensor.stop(),
        }
    }

    /// The pull sensor behind this handle, when it is one
    pub fn as_pull(&self) -> Option<&PullSensor> {
        match self {
            SensorHandle::Pull(sensor) => Some(sensor),
            SensorHandle::Push(_) => None,
        }
    }

    /// The push singleton behind this handle, when it is one
    pub fn as_push(&self) -> Option<&Arc<PushSensor>> {
        match self {
            SensorHandle::Pull(_) => None,
            SensorHandle::Push(sensor) => Some(sensor),
        }
    }
}
