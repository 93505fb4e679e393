//! Data classifiers
//!
//! A classifier is a stateless function from a sensed data window to a
//! coarse label. Classifiers are defined for the motion, scan, location and
//! audio sensors only; asking for one on any other type is a reportable
//! condition, not a crash. The numeric thresholds here are deliberately
//! simple; substituting a real model is a per-type local change.

use serde::{Deserialize, Serialize};

use crate::data::RawPayload;
use crate::error::SenseError;
use crate::types::SensorType;

/// Classification label attached to processed payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Stationary,
    Moving,
    Quiet,
    Loud,
    SparseScan,
    DenseScan,
    HighAccuracyFix,
    LowAccuracyFix,
}

/// Stateless classifier over one sensed data window.
///
/// Returns `None` when the window does not contain enough data to commit to
/// a label; that is a valid outcome, not an error.
pub trait SensorClassifier: Send + Sync {
    fn classify(&self, window: &RawPayload) -> Option<Label>;
}

/// Select the classifier for a sensor type.
///
/// Only a subset of types define one; the rest yield
/// `SenseError::ClassifierUnsupported` by design.
pub fn classifier_for(sensor_type: SensorType) -> Result<Box<dyn SensorClassifier>, SenseError> {
    match sensor_type {
        SensorType::Accelerometer => Ok(Box::new(AccelerometerClassifier)),
        SensorType::Bluetooth => Ok(Box::new(BluetoothClassifier)),
        SensorType::Location => Ok(Box::new(LocationClassifier)),
        SensorType::Microphone => Ok(Box::new(MicrophoneClassifier)),
        SensorType::Wifi => Ok(Box::new(WifiClassifier)),
        _ => Err(SenseError::ClassifierUnsupported(sensor_type)),
    }
}

const GRAVITY_MS2: f64 = 9.81;
/// Deviation from gravity (m/s^2) above which the device counts as moving
const MOTION_THRESHOLD_MS2: f64 = 0.8;
/// Normalized amplitude above which a window counts as loud
const LOUDNESS_THRESHOLD: f64 = 0.2;
/// Scan results at or above this count make a dense environment
const DENSE_SCAN_THRESHOLD: usize = 5;
/// Fix accuracy (meters) at or below which a fix counts as high accuracy
const ACCURACY_THRESHOLD_M: f64 = 50.0;

struct AccelerometerClassifier;

impl SensorClassifier for AccelerometerClassifier {
    fn classify(&self, window: &RawPayload) -> Option<Label> {
        match window {
            RawPayload::Accelerometer { samples } if !samples.is_empty() => {
                let mean: f64 = samples
                    .iter()
                    .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
                    .sum::<f64>()
                    / samples.len() as f64;
                if (mean - GRAVITY_MS2).abs() < MOTION_THRESHOLD_MS2 {
                    Some(Label::Stationary)
                } else {
                    Some(Label::Moving)
                }
            }
            _ => None,
        }
    }
}

struct MicrophoneClassifier;

impl SensorClassifier for MicrophoneClassifier {
    fn classify(&self, window: &RawPayload) -> Option<Label> {
        match window {
            RawPayload::Microphone { amplitudes } if !amplitudes.is_empty() => {
                let peak = amplitudes.iter().cloned().fold(0.0_f64, f64::max);
                if peak < LOUDNESS_THRESHOLD {
                    Some(Label::Quiet)
                } else {
                    Some(Label::Loud)
                }
            }
            _ => None,
        }
    }
}

struct BluetoothClassifier;

impl SensorClassifier for BluetoothClassifier {
    fn classify(&self, window: &RawPayload) -> Option<Label> {
        match window {
            RawPayload::Bluetooth { devices } => Some(scan_density(devices.len())),
            _ => None,
        }
    }
}

struct WifiClassifier;

impl SensorClassifier for WifiClassifier {
    fn classify(&self, window: &RawPayload) -> Option<Label> {
        match window {
            RawPayload::Wifi { access_points } => Some(scan_density(access_points.len())),
            _ => None,
        }
    }
}

struct LocationClassifier;

impl SensorClassifier for LocationClassifier {
    fn classify(&self, window: &RawPayload) -> Option<Label> {
        match window {
            RawPayload::Location { fixes } => fixes.last().map(|fix| {
                if fix.accuracy_m <= ACCURACY_THRESHOLD_M {
                    Label::HighAccuracyFix
                } else {
                    Label::LowAccuracyFix
                }
            }),
            _ => None,
        }
    }
}

fn scan_density(count: usize) -> Label {
    if count >= DENSE_SCAN_THRESHOLD {
        Label::DenseScan
    } else {
        Label::SparseScan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AccessPoint;

    #[test]
    fn test_unsupported_type_is_reported() {
        match classifier_for(SensorType::Battery) {
            Err(SenseError::ClassifierUnsupported(sensor_type)) => {
                assert_eq!(sensor_type, SensorType::Battery)
            }
            other => panic!("expected ClassifierUnsupported, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_every_declared_classifier_resolves() {
        for sensor_type in SensorType::ALL {
            assert_eq!(
                classifier_for(sensor_type).is_ok(),
                sensor_type.has_classifier(),
                "{}",
                sensor_type
            );
        }
    }

    #[test]
    fn test_accelerometer_labels() {
        let classifier = classifier_for(SensorType::Accelerometer).unwrap();

        let resting = RawPayload::Accelerometer {
            samples: vec![[0.0, 0.0, 9.8]; 10],
        };
        assert_eq!(classifier.classify(&resting), Some(Label::Stationary));

        let shaking = RawPayload::Accelerometer {
            samples: vec![[4.0, 7.0, 12.0]; 10],
        };
        assert_eq!(classifier.classify(&shaking), Some(Label::Moving));

        let empty = RawPayload::Accelerometer { samples: vec![] };
        assert_eq!(classifier.classify(&empty), None);
    }

    #[test]
    fn test_wifi_scan_density() {
        let classifier = classifier_for(SensorType::Wifi).unwrap();
        let ap = |n: usize| AccessPoint {
            ssid: format!("net-{n}"),
            bssid: format!("aa:bb:cc:dd:ee:{n:02x}"),
            rssi: -60,
        };

        let sparse = RawPayload::Wifi {
            access_points: (0..2).map(ap).collect(),
        };
        assert_eq!(classifier.classify(&sparse), Some(Label::SparseScan));

        let dense = RawPayload::Wifi {
            access_points: (0..8).map(ap).collect(),
        };
        assert_eq!(classifier.classify(&dense), Some(Label::DenseScan));
    }

    #[test]
    fn test_mismatched_window_yields_no_label() {
        let classifier = classifier_for(SensorType::Microphone).unwrap();
        let wrong = RawPayload::Screen { on: true };
        assert_eq!(classifier.classify(&wrong), None);
    }
}
