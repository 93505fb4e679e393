//! Simulated platform
//!
//! A stand-in for the device sensor/telephony/content layer: permissions can
//! be granted and revoked at runtime, samplers synthesize plausible payloads
//! for each pull sensor, and push sources emit periodic synthetic events.
//! Every fourth push event re-uses the previous identity token, the way a
//! content observer re-fires for a change it already reported, so the
//! dedup path is exercised end to end.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;

use crate::data::{
    AccessPoint, CallState, EventKind, LocationFix, NearbyDevice, PlatformEvent, RawPayload,
};
use crate::error::SenseError;
use crate::platform::{EventSource, Platform, Sampler};
use crate::types::{SensorKind, SensorType};

const DEFAULT_EVENT_PERIOD: Duration = Duration::from_millis(500);

/// How often a simulated push source re-delivers an already-reported event
const REDELIVERY_STRIDE: u64 = 4;

pub struct SimulatedPlatform {
    granted: Mutex<BTreeSet<String>>,
    event_period: Duration,
}

impl SimulatedPlatform {
    /// A platform with every permission any sensor type requires
    pub fn with_all_permissions() -> Self {
        let granted = SensorType::ALL
            .into_iter()
            .flat_map(|t| t.required_permissions().iter().map(|p| p.to_string()))
            .collect();
        Self {
            granted: Mutex::new(granted),
            event_period: DEFAULT_EVENT_PERIOD,
        }
    }

    /// A platform with no permissions granted at all
    pub fn with_no_permissions() -> Self {
        Self {
            granted: Mutex::new(BTreeSet::new()),
            event_period: DEFAULT_EVENT_PERIOD,
        }
    }

    /// How often simulated push sources emit an event
    pub fn with_event_period(mut self, period: Duration) -> Self {
        self.event_period = period;
        self
    }

    pub fn grant(&self, permission: &str) {
        self.lock_granted().insert(permission.to_string());
    }

    pub fn revoke(&self, permission: &str) {
        self.lock_granted().remove(permission);
    }

    fn lock_granted(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.granted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Platform for SimulatedPlatform {
    fn is_permission_granted(&self, permission: &str) -> bool {
        self.lock_granted().contains(permission)
    }

    fn sampler(&self, sensor_type: SensorType) -> Result<Box<dyn Sampler>, SenseError> {
        if sensor_type.kind() != SensorKind::Pull {
            return Err(SenseError::SourceUnavailable {
                sensor_type,
                reason: "not a pull sensor".to_string(),
            });
        }
        Ok(Box::new(SimulatedSampler {
            sensor_type,
            tick: 0,
        }))
    }

    fn event_source(&self, sensor_type: SensorType) -> Result<Box<dyn EventSource>, SenseError> {
        if sensor_type.kind() != SensorKind::Push {
            return Err(SenseError::SourceUnavailable {
                sensor_type,
                reason: "not a push sensor".to_string(),
            });
        }
        Ok(Box::new(SimulatedSource {
            sensor_type,
            period: self.event_period,
            stop: None,
            worker: None,
        }))
    }
}

struct SimulatedSampler {
    sensor_type: SensorType,
    tick: u64,
}

impl Sampler for SimulatedSampler {
    fn sample(&mut self, window: Duration) -> RawPayload {
        thread::sleep(window);
        self.tick += 1;
        pull_payload(self.sensor_type, self.tick)
    }
}

fn pull_payload(sensor_type: SensorType, tick: u64) -> RawPayload {
    match sensor_type {
        SensorType::Accelerometer => RawPayload::Accelerometer {
            samples: (0..16)
                .map(|i| [0.02 * i as f64, -0.01 * i as f64, 9.81 + 0.05 * (tick % 3) as f64])
                .collect(),
        },
        SensorType::Bluetooth => RawPayload::Bluetooth {
            devices: (0..tick % 4)
                .map(|i| NearbyDevice {
                    address: format!("aa:bb:cc:00:00:{i:02x}"),
                    name: Some(format!("device-{i}")),
                    rssi: -50 - (i as i32) * 5,
                })
                .collect(),
        },
        SensorType::Location => RawPayload::Location {
            fixes: vec![LocationFix {
                latitude: 52.2053 + 0.0001 * (tick % 10) as f64,
                longitude: 0.1218,
                accuracy_m: 25.0 + 10.0 * (tick % 5) as f64,
            }],
        },
        SensorType::Microphone => RawPayload::Microphone {
            amplitudes: (0..32).map(|i| 0.01 * ((i + tick) % 20) as f64).collect(),
        },
        SensorType::Wifi => RawPayload::Wifi {
            access_points: (0..2 + tick % 6)
                .map(|i| AccessPoint {
                    ssid: format!("net-{i}"),
                    bssid: format!("de:ad:be:ef:00:{i:02x}"),
                    rssi: -40 - (i as i32) * 7,
                })
                .collect(),
        },
        SensorType::Application => RawPayload::Application {
            running_apps: vec![
                "org.example.launcher".to_string(),
                format!("org.example.app{}", tick % 3),
            ],
        },
        // Push types never reach a sampler
        _ => RawPayload::Screen { on: false },
    }
}

struct SimulatedSource {
    sensor_type: SensorType,
    period: Duration,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl EventSource for SimulatedSource {
    fn subscribe(&mut self, events: Sender<PlatformEvent>) {
        let (stop_tx, stop_rx) = mpsc::channel();
        self.stop = Some(stop_tx);
        let sensor_type = self.sensor_type;
        let period = self.period;
        self.worker = Some(thread::spawn(move || {
            emit_events(sensor_type, period, stop_rx, events);
        }));
    }

    fn unsubscribe(&mut self) {
        // Dropping the stop sender wakes the emitter; joining it guarantees
        // the event sender is dropped before unsubscribe returns.
        self.stop = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn emit_events(
    sensor_type: SensorType,
    period: Duration,
    stop: Receiver<()>,
    events: Sender<PlatformEvent>,
) {
    let mut seq: u64 = 0;
    loop {
        match stop.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => {}
            _ => break,
        }

        // Re-deliver the previous identity every few events
        let identity = if seq > 0 && seq % REDELIVERY_STRIDE == 0 {
            format!("evt-{}", seq - 1)
        } else {
            format!("evt-{seq}")
        };
        let event = PlatformEvent {
            timestamp: Utc::now(),
            identity,
            kind: push_event_kind(sensor_type),
            payload: push_payload(sensor_type, seq),
        };
        if events.send(event).is_err() {
            break;
        }
        seq += 1;
    }
}

fn push_event_kind(sensor_type: SensorType) -> EventKind {
    match sensor_type {
        SensorType::Sms => EventKind::Received,
        _ => EventKind::StateChanged,
    }
}

fn push_payload(sensor_type: SensorType, seq: u64) -> RawPayload {
    match sensor_type {
        SensorType::Battery => RawPayload::Battery {
            level_pct: (100 - seq % 100) as u8,
            charging: seq % 2 == 0,
            temperature_c: 28.5,
        },
        SensorType::PhoneState => RawPayload::PhoneState {
            state: if seq % 2 == 0 {
                CallState::Idle
            } else {
                CallState::Ringing
            },
            number: None,
        },
        SensorType::Proximity => RawPayload::Proximity {
            distance_cm: if seq % 2 == 0 { 0.0 } else { 5.0 },
            max_range_cm: 5.0,
        },
        SensorType::Screen => RawPayload::Screen { on: seq % 2 == 0 },
        SensorType::Sms => RawPayload::Sms {
            body: format!("simulated message {seq}"),
            address: "+441223000000".to_string(),
        },
        SensorType::ConnectionState => RawPayload::ConnectionState {
            connected: seq % 3 != 0,
            network: Some("wifi".to_string()),
        },
        // Pull types never reach an event source
        _ => RawPayload::Screen { on: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_toggling() {
        let platform = SimulatedPlatform::with_no_permissions();
        assert!(!platform.is_permission_granted("READ_SMS"));
        platform.grant("READ_SMS");
        assert!(platform.is_permission_granted("READ_SMS"));
        platform.revoke("READ_SMS");
        assert!(!platform.is_permission_granted("READ_SMS"));
    }

    #[test]
    fn test_sampler_payload_matches_sensor_type() {
        let platform = SimulatedPlatform::with_all_permissions();
        for sensor_type in SensorType::ALL.into_iter().filter(|t| t.is_pull()) {
            let mut sampler = platform.sampler(sensor_type).unwrap();
            let payload = sampler.sample(Duration::from_millis(1));
            assert_eq!(payload.sensor_type(), sensor_type);
        }
    }

    #[test]
    fn test_sampler_refused_for_push_type() {
        let platform = SimulatedPlatform::with_all_permissions();
        assert!(platform.sampler(SensorType::Battery).is_err());
        assert!(platform.event_source(SensorType::Wifi).is_err());
    }

    #[test]
    fn test_source_delivers_then_stops_on_unsubscribe() {
        let platform =
            SimulatedPlatform::with_all_permissions().with_event_period(Duration::from_millis(5));
        let mut source = platform.event_source(SensorType::Screen).unwrap();

        let (tx, rx) = mpsc::channel();
        source.subscribe(tx);
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.payload.sensor_type(), SensorType::Screen);

        source.unsubscribe();
        // Channel closes once the emitter has exited
        while rx.recv_timeout(Duration::from_millis(50)).is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
