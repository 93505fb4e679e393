//! Sensor type registry table
//!
//! Every sensor the framework knows about is described by one row in a static
//! table: stable integer code, canonical name, log tag, pull/push kind, and
//! the platform permissions its source requires. Adding a sensor type is a
//! table edit, not a new branch ladder.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::SenseError;

/// Enumerated sensor identifier with a stable integer code.
///
/// Codes are part of the external contract (storage, upload, cross-process
/// references) and must never be renumbered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(i32)]
pub enum SensorType {
    Accelerometer = 5001,
    Battery = 5002,
    Bluetooth = 5003,
    Location = 5004,
    Microphone = 5005,
    PhoneState = 5006,
    Proximity = 5007,
    Screen = 5008,
    Sms = 5009,
    Wifi = 5010,
    ConnectionState = 5011,
    Application = 5012,
}

/// How a sensor delivers data: sampled on a schedule, or platform-notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Pull,
    Push,
}

/// Static per-type facts consulted by the registry and factories
struct SensorSpec {
    name: &'static str,
    log_tag: &'static str,
    kind: SensorKind,
    permissions: &'static [&'static str],
    has_classifier: bool,
}

static SENSOR_TABLE: Lazy<BTreeMap<SensorType, SensorSpec>> = Lazy::new(|| {
    use SensorKind::{Pull, Push};
    let mut table = BTreeMap::new();
    let mut row = |sensor_type: SensorType,
                   name: &'static str,
                   log_tag: &'static str,
                   kind: SensorKind,
                   permissions: &'static [&'static str],
                   has_classifier: bool| {
        table.insert(
            sensor_type,
            SensorSpec {
                name,
                log_tag,
                kind,
                permissions,
                has_classifier,
            },
        );
    };

    row(
        SensorType::Accelerometer,
        "Accelerometer",
        "AccelerometerSensor",
        Pull,
        &[],
        true,
    );
    row(SensorType::Battery, "Battery", "BatterySensor", Push, &[], false);
    row(
        SensorType::Bluetooth,
        "Bluetooth",
        "BluetoothSensor",
        Pull,
        &[],
        true,
    );
    row(
        SensorType::Location,
        "Location",
        "LocationSensor",
        Pull,
        &[],
        true,
    );
    row(
        SensorType::Microphone,
        "Microphone",
        "MicrophoneSensor",
        Pull,
        &[],
        true,
    );
    row(
        SensorType::PhoneState,
        "PhoneState",
        "PhoneStateSensor",
        Push,
        &["READ_PHONE_STATE"],
        false,
    );
    row(
        SensorType::Proximity,
        "Proximity",
        "ProximitySensor",
        Push,
        &[],
        false,
    );
    row(SensorType::Screen, "Screen", "ScreenSensor", Push, &[], false);
    row(
        SensorType::Sms,
        "SMS",
        "SmsSensor",
        Push,
        &["RECEIVE_SMS", "READ_SMS"],
        false,
    );
    row(SensorType::Wifi, "WiFi", "WifiSensor", Pull, &[], true);
    row(
        SensorType::ConnectionState,
        "Connection",
        "ConnectionStateSensor",
        Push,
        &["ACCESS_NETWORK_STATE"],
        false,
    );
    row(
        SensorType::Application,
        "Application",
        "ApplicationSensor",
        Pull,
        &[],
        false,
    );
    table
});

impl SensorType {
    /// Every registered sensor type, in code order
    pub const ALL: [SensorType; 12] = [
        SensorType::Accelerometer,
        SensorType::Battery,
        SensorType::Bluetooth,
        SensorType::Location,
        SensorType::Microphone,
        SensorType::PhoneState,
        SensorType::Proximity,
        SensorType::Screen,
        SensorType::Sms,
        SensorType::Wifi,
        SensorType::ConnectionState,
        SensorType::Application,
    ];

    /// Stable integer code for this sensor type
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a sensor type by its integer code
    pub fn from_code(code: i32) -> Result<Self, SenseError> {
        SensorType::ALL
            .into_iter()
            .find(|sensor_type| sensor_type.code() == code)
            .ok_or(SenseError::UnknownSensorType(code))
    }

    /// Look up a sensor type by its canonical name
    pub fn from_name(name: &str) -> Result<Self, SenseError> {
        SensorType::ALL
            .into_iter()
            .find(|sensor_type| sensor_type.name() == name)
            .ok_or_else(|| SenseError::UnknownSensorName(name.to_string()))
    }

    /// Canonical human-readable name
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Tag used to attribute log lines to this sensor
    pub fn log_tag(self) -> &'static str {
        self.spec().log_tag
    }

    /// Whether this sensor is sampled (pull) or platform-notified (push)
    pub fn kind(self) -> SensorKind {
        self.spec().kind
    }

    pub fn is_pull(self) -> bool {
        self.kind() == SensorKind::Pull
    }

    /// Platform permissions that must be granted before a push source for
    /// this type can be constructed. Empty for permissionless sensors and
    /// for all pull sensors, whose gating is the platform sampler's concern.
    pub fn required_permissions(self) -> &'static [&'static str] {
        self.spec().permissions
    }

    /// Whether a data classifier is defined for this type
    pub fn has_classifier(self) -> bool {
        self.spec().has_classifier
    }

    fn spec(self) -> &'static SensorSpec {
        &SENSOR_TABLE[&self]
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code_name_bijection_round_trip() {
        for sensor_type in SensorType::ALL {
            assert_eq!(SensorType::from_name(sensor_type.name()).unwrap(), sensor_type);
            assert_eq!(SensorType::from_code(sensor_type.code()).unwrap(), sensor_type);
            assert_eq!(
                SensorType::from_name(sensor_type.name()).unwrap().name(),
                sensor_type.name()
            );
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = SensorType::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SensorType::ALL.len());
    }

    #[test]
    fn test_unknown_code_is_reported() {
        match SensorType::from_code(5013) {
            Err(SenseError::UnknownSensorType(code)) => assert_eq!(code, 5013),
            other => panic!("expected UnknownSensorType, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_is_reported() {
        match SensorType::from_name("Thermometer") {
            Err(SenseError::UnknownSensorName(name)) => assert_eq!(name, "Thermometer"),
            other => panic!("expected UnknownSensorName, got {:?}", other),
        }
    }

    #[test]
    fn test_pull_push_partition() {
        let pull: Vec<SensorType> = SensorType::ALL
            .into_iter()
            .filter(|t| t.is_pull())
            .collect();
        assert_eq!(
            pull,
            vec![
                SensorType::Accelerometer,
                SensorType::Bluetooth,
                SensorType::Location,
                SensorType::Microphone,
                SensorType::Wifi,
                SensorType::Application,
            ]
        );
    }

    #[test]
    fn test_sms_contract() {
        assert_eq!(SensorType::Sms.code(), 5009);
        assert_eq!(SensorType::Sms.log_tag(), "SmsSensor");
        assert_eq!(
            SensorType::Sms.required_permissions(),
            &["RECEIVE_SMS", "READ_SMS"]
        );
    }

    #[test]
    fn test_classifier_coverage() {
        let supported: Vec<SensorType> = SensorType::ALL
            .into_iter()
            .filter(|t| t.has_classifier())
            .collect();
        assert_eq!(
            supported,
            vec![
                SensorType::Accelerometer,
                SensorType::Bluetooth,
                SensorType::Location,
                SensorType::Microphone,
                SensorType::Wifi,
            ]
        );
    }
}
