//! Sensekit - on-device sensing framework
//!
//! Sensekit multiplexes heterogeneous data sources behind one uniform
//! abstraction: periodic "pull" sensors are driven through a duty cycle of
//! sense windows and sleep intervals, asynchronous "push" sensors are
//! subscribed once and deduplicated per platform notification, and every
//! sensed event becomes a typed immutable record.
//!
//! ## Modules
//!
//! - **Registry**: sensor-type table, factory dispatch, per-type defaults
//! - **Scheduler**: sense-window / sleep / cycle state machine for pull sensors
//! - **Sensors**: pull duty-cycle workers and push singleton lifecycles
//! - **Processor**: raw event + config snapshot → `SensorRecord`
//! - **Platform**: collaborator traits for the device layer and record sinks

pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod platform;
pub mod processor;
pub mod registry;
pub mod scheduler;
pub mod sensors;
pub mod sim;
pub mod types;

pub use classifier::{classifier_for, Label, SensorClassifier};
pub use config::{ConfigValue, SensorConfig};
pub use data::{PlatformEvent, ProcessedPayload, RawPayload, SensorRecord};
pub use error::SenseError;
pub use platform::{EventSource, Platform, RecordSink, Sampler};
pub use processor::Processor;
pub use registry::SensorRegistry;
pub use scheduler::{CycleState, DutyCycle, SleepPolicy};
pub use sensors::{PullSensor, PushSensor, SensorHandle};
pub use types::{SensorKind, SensorType};

/// Framework version embedded in CLI output
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported alongside emitted records
pub const PRODUCER_NAME: &str = "sensekit";
