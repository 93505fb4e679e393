//! Sensor configuration
//!
//! A configuration is an ordered bag of typed parameters with value
//! semantics: every consumer that uses one during an asynchronous operation
//! clones it first, so an in-flight sensing cycle never observes a later
//! mutation of the defaults it started from.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::SensorType;

/// Length of one sense window for single-window pull sensors (millis)
pub const SENSE_WINDOW_MILLIS: &str = "sense-window-millis";
/// Sleep interval between duty cycles (millis)
pub const POST_SENSE_SLEEP_MILLIS: &str = "post-sense-sleep-millis";
/// Length of one sense window for multi-cycle pull sensors (millis)
pub const SENSE_WINDOW_PER_CYCLE_MILLIS: &str = "sense-window-per-cycle-millis";
/// Number of duty cycles before a bounded pull sensor stops on its own
pub const NUMBER_OF_CYCLES: &str = "number-of-cycles";
/// Hardware sampling rate hint
pub const SAMPLING_DELAY: &str = "sampling-delay";
/// Requested location fix accuracy
pub const LOCATION_ACCURACY: &str = "location-accuracy";
/// Whether the sleep interval may be recomputed between cycles
pub const ADAPTIVE_SENSING_ENABLED: &str = "adaptive-sensing-enabled";

const ACCELEROMETER_WINDOW_MILLIS: u64 = 3_000;
const ACCELEROMETER_SLEEP_MILLIS: u64 = 10_000;
const BLUETOOTH_CYCLES: u32 = 3;
const BLUETOOTH_WINDOW_PER_CYCLE_MILLIS: u64 = 15_000;
const BLUETOOTH_SLEEP_MILLIS: u64 = 60_000;
const LOCATION_WINDOW_MILLIS: u64 = 30_000;
const LOCATION_SLEEP_MILLIS: u64 = 60_000;
const MICROPHONE_WINDOW_MILLIS: u64 = 10_000;
const MICROPHONE_SLEEP_MILLIS: u64 = 30_000;
const WIFI_CYCLES: u32 = 3;
const WIFI_WINDOW_PER_CYCLE_MILLIS: u64 = 10_000;
const WIFI_SLEEP_MILLIS: u64 = 60_000;
const APPLICATION_CYCLES: u32 = 5;
const APPLICATION_WINDOW_PER_CYCLE_MILLIS: u64 = 5_000;
const APPLICATION_SLEEP_MILLIS: u64 = 30_000;

/// Requested accuracy for location fixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationAccuracy {
    Coarse,
    Fine,
}

/// Hardware sampling rate hint for continuous sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingDelay {
    Fastest,
    Game,
    Ui,
    Normal,
}

/// A single typed configuration parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigValue {
    Millis(u64),
    Count(u32),
    Accuracy(LocationAccuracy),
    Delay(SamplingDelay),
    Flag(bool),
}

/// Ordered parameter bag attached to every sensing operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    params: BTreeMap<String, ConfigValue>,
}

impl SensorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the fixed default configuration for a sensor type.
    ///
    /// Windowed pull sensors get a sense window and a sleep interval;
    /// multi-cycle scan sensors get a cycle count, a per-cycle window, and a
    /// sleep interval. Adaptive sensing is disabled for every type.
    pub fn default_for(sensor_type: SensorType) -> Self {
        let mut config = Self::new();
        match sensor_type {
            SensorType::Accelerometer => {
                config.set(SENSE_WINDOW_MILLIS, ConfigValue::Millis(ACCELEROMETER_WINDOW_MILLIS));
                config.set(POST_SENSE_SLEEP_MILLIS, ConfigValue::Millis(ACCELEROMETER_SLEEP_MILLIS));
                config.set(SAMPLING_DELAY, ConfigValue::Delay(SamplingDelay::Game));
            }
            SensorType::Bluetooth => {
                config.set(NUMBER_OF_CYCLES, ConfigValue::Count(BLUETOOTH_CYCLES));
                config.set(
                    SENSE_WINDOW_PER_CYCLE_MILLIS,
                    ConfigValue::Millis(BLUETOOTH_WINDOW_PER_CYCLE_MILLIS),
                );
                config.set(POST_SENSE_SLEEP_MILLIS, ConfigValue::Millis(BLUETOOTH_SLEEP_MILLIS));
            }
            SensorType::Location => {
                config.set(SENSE_WINDOW_MILLIS, ConfigValue::Millis(LOCATION_WINDOW_MILLIS));
                config.set(POST_SENSE_SLEEP_MILLIS, ConfigValue::Millis(LOCATION_SLEEP_MILLIS));
                config.set(LOCATION_ACCURACY, ConfigValue::Accuracy(LocationAccuracy::Coarse));
            }
            SensorType::Microphone => {
                config.set(SENSE_WINDOW_MILLIS, ConfigValue::Millis(MICROPHONE_WINDOW_MILLIS));
                config.set(POST_SENSE_SLEEP_MILLIS, ConfigValue::Millis(MICROPHONE_SLEEP_MILLIS));
            }
            SensorType::Wifi => {
                config.set(NUMBER_OF_CYCLES, ConfigValue::Count(WIFI_CYCLES));
                config.set(
                    SENSE_WINDOW_PER_CYCLE_MILLIS,
                    ConfigValue::Millis(WIFI_WINDOW_PER_CYCLE_MILLIS),
                );
                config.set(POST_SENSE_SLEEP_MILLIS, ConfigValue::Millis(WIFI_SLEEP_MILLIS));
            }
            SensorType::Application => {
                config.set(NUMBER_OF_CYCLES, ConfigValue::Count(APPLICATION_CYCLES));
                config.set(
                    SENSE_WINDOW_PER_CYCLE_MILLIS,
                    ConfigValue::Millis(APPLICATION_WINDOW_PER_CYCLE_MILLIS),
                );
                config.set(POST_SENSE_SLEEP_MILLIS, ConfigValue::Millis(APPLICATION_SLEEP_MILLIS));
            }
            // Push sensors have no duty cycle to parameterize
            SensorType::Battery
            | SensorType::PhoneState
            | SensorType::Proximity
            | SensorType::Screen
            | SensorType::Sms
            | SensorType::ConnectionState => {}
        }
        config.set(ADAPTIVE_SENSING_ENABLED, ConfigValue::Flag(false));
        config
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.params.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.params.get(key)
    }

    /// Read a millisecond parameter as a `Duration`
    pub fn millis(&self, key: &str) -> Option<Duration> {
        match self.params.get(key) {
            Some(ConfigValue::Millis(ms)) => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    pub fn count(&self, key: &str) -> Option<u32> {
        match self.params.get(key) {
            Some(ConfigValue::Count(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.params.get(key) {
            Some(ConfigValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
