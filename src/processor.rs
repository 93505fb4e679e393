//! Processing pipeline
//!
//! A `Processor` turns a raw platform payload plus a configuration snapshot
//! into a `SensorRecord`. The raw and processed payloads are independently
//! toggleable at construction time; a failed derivation degrades to a
//! partial record instead of an error, so the raw payload (when requested)
//! is never lost to a derivation problem.

use chrono::{DateTime, Utc};

use crate::classifier::{classifier_for, Label};
use crate::config::SensorConfig;
use crate::data::{ProcessedPayload, RawPayload, SensorRecord};
use crate::types::SensorType;

/// Per-sensor record builder with independent raw/processed toggles
#[derive(Debug, Clone)]
pub struct Processor {
    sensor_type: SensorType,
    include_raw: bool,
    include_processed: bool,
}

impl Processor {
    pub fn new(sensor_type: SensorType, include_raw: bool, include_processed: bool) -> Self {
        Self {
            sensor_type,
            include_raw,
            include_processed,
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// Build a record from one sensed payload.
    ///
    /// The configuration is cloned into the record so later mutations of the
    /// caller's copy never retroactively alter a record already in flight.
    pub fn process(
        &self,
        timestamp: DateTime<Utc>,
        payload: RawPayload,
        config: &SensorConfig,
    ) -> SensorRecord {
        let mut record = SensorRecord::new(self.sensor_type, timestamp, config.clone());
        if self.include_processed {
            record.processed = derive(self.sensor_type, &payload);
        }
        if self.include_raw {
            record.raw = Some(payload);
        }
        record
    }
}

/// Type-specific derivation. `None` means the window could not be
/// summarized; the record is still valid without it.
fn derive(sensor_type: SensorType, payload: &RawPayload) -> Option<ProcessedPayload> {
    let label = window_label(sensor_type, payload);
    match payload {
        RawPayload::Accelerometer { samples } => {
            if samples.is_empty() {
                return None;
            }
            let magnitudes: Vec<f64> = samples
                .iter()
                .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
                .collect();
            let mean_magnitude = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
            let peak_magnitude = magnitudes.iter().cloned().fold(0.0_f64, f64::max);
            Some(ProcessedPayload::Motion {
                mean_magnitude,
                peak_magnitude,
                label,
            })
        }
        RawPayload::Bluetooth { devices } => {
            let mut addresses: Vec<&str> = devices.iter().map(|d| d.address.as_str()).collect();
            addresses.sort_unstable();
            addresses.dedup();
            Some(ProcessedPayload::DeviceScan {
                unique_devices: addresses.len(),
                strongest_rssi: devices.iter().map(|d| d.rssi).max(),
                label,
            })
        }
        RawPayload::Location { fixes } => {
            let fix = fixes.last()?;
            Some(ProcessedPayload::Position {
                latitude: fix.latitude,
                longitude: fix.longitude,
                label,
            })
        }
        RawPayload::Microphone { amplitudes } => {
            if amplitudes.is_empty() {
                return None;
            }
            let mean_amplitude = amplitudes.iter().sum::<f64>() / amplitudes.len() as f64;
            let peak_amplitude = amplitudes.iter().cloned().fold(0.0_f64, f64::max);
            Some(ProcessedPayload::Audio {
                mean_amplitude,
                peak_amplitude,
                label,
            })
        }
        RawPayload::Wifi { access_points } => {
            let mut bssids: Vec<&str> = access_points.iter().map(|ap| ap.bssid.as_str()).collect();
            bssids.sort_unstable();
            bssids.dedup();
            Some(ProcessedPayload::NetworkScan {
                unique_networks: bssids.len(),
                strongest_rssi: access_points.iter().map(|ap| ap.rssi).max(),
                label,
            })
        }
        RawPayload::Application { running_apps } => {
            let mut unique_apps = running_apps.clone();
            unique_apps.sort_unstable();
            unique_apps.dedup();
            Some(ProcessedPayload::AppUsage { unique_apps })
        }
        RawPayload::Sms { body, .. } => Some(ProcessedPayload::Message { length: body.len() }),
        RawPayload::Battery {
            level_pct,
            charging,
            ..
        } => Some(ProcessedPayload::Power {
            level_pct: *level_pct,
            charging: *charging,
        }),
        RawPayload::PhoneState { state, .. } => Some(ProcessedPayload::Call { state: *state }),
        RawPayload::Proximity {
            distance_cm,
            max_range_cm,
        } => Some(ProcessedPayload::Presence {
            near: distance_cm < max_range_cm,
        }),
        RawPayload::Screen { on } => Some(ProcessedPayload::ScreenState { on: *on }),
        RawPayload::ConnectionState { connected, .. } => {
            Some(ProcessedPayload::Connectivity {
                connected: *connected,
            })
        }
    }
}

/// Consult the classifier for types that define one; everything else gets no
/// label, which is the designed outcome rather than a failure.
fn window_label(sensor_type: SensorType, payload: &RawPayload) -> Option<Label> {
    classifier_for(sensor_type)
        .ok()
        .and_then(|classifier| classifier.classify(payload))
}
