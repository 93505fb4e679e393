//! Data records flowing through the pipeline
//!
//! Raw payloads are what a platform source hands over per sense window or
//! notification; processed payloads are the per-type derived summaries; a
//! `SensorRecord` is the immutable output unit, carrying either, both, or
//! neither payload next to a timestamp and the configuration snapshot in
//! effect when it was produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::Label;
use crate::config::SensorConfig;
use crate::types::SensorType;

/// What kind of platform notification produced a push event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// New inbound item (e.g. an SMS delivered to the device)
    Received,
    /// Observed change in a content store (e.g. an SMS sent from the device)
    ContentChanged,
    /// State transition (screen, battery, call, connectivity)
    StateChanged,
}

/// A nearby device seen during a bluetooth scan window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyDevice {
    pub address: String,
    pub name: Option<String>,
    pub rssi: i32,
}

/// An access point seen during a wifi scan window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub ssid: String,
    pub bssid: String,
    pub rssi: i32,
}

/// One location fix captured during a sense window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
}

/// Telephony call state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

/// Type-specific payload captured from the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "snake_case")]
pub enum RawPayload {
    Accelerometer { samples: Vec<[f64; 3]> },
    Battery { level_pct: u8, charging: bool, temperature_c: f64 },
    Bluetooth { devices: Vec<NearbyDevice> },
    Location { fixes: Vec<LocationFix> },
    Microphone { amplitudes: Vec<f64> },
    PhoneState { state: CallState, number: Option<String> },
    Proximity { distance_cm: f64, max_range_cm: f64 },
    Screen { on: bool },
    Sms { body: String, address: String },
    Wifi { access_points: Vec<AccessPoint> },
    ConnectionState { connected: bool, network: Option<String> },
    Application { running_apps: Vec<String> },
}

impl RawPayload {
    /// The sensor type this payload belongs to
    pub fn sensor_type(&self) -> SensorType {
        match self {
            RawPayload::Accelerometer { .. } => SensorType::Accelerometer,
            RawPayload::Battery { .. } => SensorType::Battery,
            RawPayload::Bluetooth { .. } => SensorType::Bluetooth,
            RawPayload::Location { .. } => SensorType::Location,
            RawPayload::Microphone { .. } => SensorType::Microphone,
            RawPayload::PhoneState { .. } => SensorType::PhoneState,
            RawPayload::Proximity { .. } => SensorType::Proximity,
            RawPayload::Screen { .. } => SensorType::Screen,
            RawPayload::Sms { .. } => SensorType::Sms,
            RawPayload::Wifi { .. } => SensorType::Wifi,
            RawPayload::ConnectionState { .. } => SensorType::ConnectionState,
            RawPayload::Application { .. } => SensorType::Application,
        }
    }
}

/// Derived summary attached to a record when processed output is requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessedPayload {
    Motion {
        mean_magnitude: f64,
        peak_magnitude: f64,
        label: Option<Label>,
    },
    DeviceScan {
        unique_devices: usize,
        strongest_rssi: Option<i32>,
        label: Option<Label>,
    },
    Position {
        latitude: f64,
        longitude: f64,
        label: Option<Label>,
    },
    Audio {
        mean_amplitude: f64,
        peak_amplitude: f64,
        label: Option<Label>,
    },
    NetworkScan {
        unique_networks: usize,
        strongest_rssi: Option<i32>,
        label: Option<Label>,
    },
    AppUsage {
        unique_apps: Vec<String>,
    },
    Message {
        length: usize,
    },
    Power {
        level_pct: u8,
        charging: bool,
    },
    Call {
        state: CallState,
    },
    Presence {
        near: bool,
    },
    ScreenState {
        on: bool,
    },
    Connectivity {
        connected: bool,
    },
}

/// One notification delivered by a push source over the event channel.
///
/// The identity token names the logical platform event; re-deliveries of the
/// same event carry the same token and are collapsed by the lifecycle
/// manager.
#[derive(Debug, Clone)]
pub struct PlatformEvent {
    pub timestamp: DateTime<Utc>,
    pub identity: String,
    pub kind: EventKind,
    pub payload: RawPayload,
}

/// Immutable output unit of the processing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorRecord {
    pub record_id: Uuid,
    pub sensor_type: SensorType,
    pub timestamp: DateTime<Utc>,
    /// Snapshot of the configuration in effect when this record was produced
    pub config: SensorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<ProcessedPayload>,
}

impl SensorRecord {
    pub(crate) fn new(
        sensor_type: SensorType,
        timestamp: DateTime<Utc>,
        config: SensorConfig,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            sensor_type,
            timestamp,
            config,
            raw: None,
            processed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_sensor_type_mapping() {
        let payload = RawPayload::Sms {
            body: "hello".to_string(),
            address: "+15551234".to_string(),
        };
        assert_eq!(payload.sensor_type(), SensorType::Sms);

        let payload = RawPayload::Application {
            running_apps: vec!["org.example.mail".to_string()],
        };
        assert_eq!(payload.sensor_type(), SensorType::Application);
    }

    #[test]
    fn test_record_serializes_without_absent_payloads() {
        let record = SensorRecord::new(
            SensorType::Screen,
            Utc::now(),
            SensorConfig::default_for(SensorType::Screen),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("raw").is_none());
        assert!(json.get("processed").is_none());
        assert!(json.get("record_id").is_some());
    }
}
