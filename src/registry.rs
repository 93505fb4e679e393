//! Sensor registry and factory
//!
//! Maps sensor types to concrete instances: pull sensors are built per
//! request, push sensors are process-wide singletons created lazily behind
//! one mutex. Building the full sensor set is partial-failure tolerant; a
//! device missing one permission or one piece of hardware still yields a
//! usable, smaller set.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::classifier;
use crate::config::SensorConfig;
use crate::error::SenseError;
use crate::platform::Platform;
use crate::sensors::{PullSensor, PushSensor, SensorHandle};
use crate::types::{SensorKind, SensorType};

const TAG: &str = "SensorRegistry";

/// Look up a sensor type by canonical name
pub fn type_of(name: &str) -> Result<SensorType, SenseError> {
    SensorType::from_name(name)
}

/// Look up the canonical name for a sensor type code
pub fn name_of(code: i32) -> Result<&'static str, SenseError> {
    SensorType::from_code(code)
        .map(SensorType::name)
        .map_err(|_| SenseError::UnknownSensorName(format!("type code {code}")))
}

/// The fixed default configuration for a sensor type
pub fn default_config(sensor_type: SensorType) -> SensorConfig {
    SensorConfig::default_for(sensor_type)
}

/// The classifier for a sensor type, when one is defined
pub use classifier::classifier_for;

pub struct SensorRegistry {
    platform: Arc<dyn Platform>,
    push_singletons: Mutex<BTreeMap<SensorType, Arc<PushSensor>>>,
}

impl SensorRegistry {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            push_singletons: Mutex::new(BTreeMap::new()),
        }
    }

    /// Resolve one sensor type to a usable handle with its default
    /// configuration attached.
    pub fn resolve(&self, sensor_type: SensorType) -> Result<SensorHandle, SenseError> {
        match sensor_type.kind() {
            SensorKind::Pull => Ok(SensorHandle::Pull(PullSensor::new(
                sensor_type,
                SensorConfig::default_for(sensor_type),
                Arc::clone(&self.platform),
            ))),
            SensorKind::Push => Ok(SensorHandle::Push(self.push_singleton(sensor_type)?)),
        }
    }

    /// Resolve by raw type code
    pub fn resolve_code(&self, code: i32) -> Result<SensorHandle, SenseError> {
        self.resolve(SensorType::from_code(code)?)
    }

    /// Resolve every known sensor type, keeping successes and discarding
    /// failures with a warning. Never fails; an empty set is a valid result.
    pub fn get_all(&self) -> Vec<SensorHandle> {
        let mut sensors = Vec::new();
        for sensor_type in SensorType::ALL {
            match self.resolve(sensor_type) {
                Ok(handle) => sensors.push(handle),
                Err(err) => log::warn!("{TAG}: skipping {}: {err}", sensor_type.name()),
            }
        }
        sensors
    }

    /// Get or lazily create the singleton for a push sensor type.
    ///
    /// A failed construction inserts nothing, so the failure is not
    /// remembered: a later call after a permission grant retries and
    /// succeeds.
    fn push_singleton(&self, sensor_type: SensorType) -> Result<Arc<PushSensor>, SenseError> {
        let mut singletons = self
            .push_singletons
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = singletons.get(&sensor_type) {
            return Ok(Arc::clone(existing));
        }

        for permission in sensor_type.required_permissions() {
            if !self.platform.is_permission_granted(permission) {
                return Err(SenseError::PermissionDenied {
                    sensor_type,
                    permission: permission.to_string(),
                });
            }
        }

        let source = self.platform.event_source(sensor_type)?;
        let sensor = Arc::new(PushSensor::new(
            sensor_type,
            SensorConfig::default_for(sensor_type),
            source,
        ));
        singletons.insert(sensor_type, Arc::clone(&sensor));
        Ok(sensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedPlatform;
    use std::time::Duration;

    fn registry(platform: SimulatedPlatform) -> SensorRegistry {
        SensorRegistry::new(Arc::new(platform))
    }

    #[test]
    fn test_get_all_with_every_permission() {
        let registry = registry(SimulatedPlatform::with_all_permissions());
        assert_eq!(registry.get_all().len(), SensorType::ALL.len());
    }

    #[test]
    fn test_get_all_without_permissions_keeps_the_rest() {
        let registry = registry(SimulatedPlatform::with_no_permissions());
        let sensors = registry.get_all();

        // All six pull sensors plus the permissionless push sensors
        let expected = [
            SensorType::Accelerometer,
            SensorType::Battery,
            SensorType::Bluetooth,
            SensorType::Location,
            SensorType::Microphone,
            SensorType::Proximity,
            SensorType::Screen,
            SensorType::Wifi,
            SensorType::Application,
        ];
        let resolved: Vec<SensorType> = sensors.iter().map(|s| s.sensor_type()).collect();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_sms_permission_denied_then_granted() {
        let platform = Arc::new(SimulatedPlatform::with_no_permissions());
        let registry = SensorRegistry::new(platform.clone());

        match registry.resolve_code(5009) {
            Err(SenseError::PermissionDenied { sensor_type, .. }) => {
                assert_eq!(sensor_type, SensorType::Sms)
            }
            _ => panic!("expected PermissionDenied"),
        }

        // The denial was not cached; granting the permissions makes the
        // next attempt construct the singleton.
        platform.grant("RECEIVE_SMS");
        platform.grant("READ_SMS");

        let handle = registry.resolve_code(5009).unwrap();
        assert_eq!(handle.sensor_type().code(), 5009);
        assert_eq!(handle.log_tag(), "SmsSensor");
    }

    #[test]
    fn test_push_singleton_is_shared() {
        let registry = registry(SimulatedPlatform::with_all_permissions());

        let first = registry.resolve(SensorType::Battery).unwrap();
        let second = registry.resolve(SensorType::Battery).unwrap();
        assert!(Arc::ptr_eq(
            first.as_push().unwrap(),
            second.as_push().unwrap()
        ));
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        let registry = Arc::new(registry(SimulatedPlatform::with_all_permissions()));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let handle = registry.resolve(SensorType::Screen).unwrap();
                    Arc::clone(handle.as_push().unwrap())
                })
            })
            .collect();

        let sensors: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        for sensor in &sensors[1..] {
            assert!(Arc::ptr_eq(&sensors[0], sensor));
        }
    }

    #[test]
    fn test_pull_sensors_are_fresh_per_request() {
        let registry = registry(SimulatedPlatform::with_all_permissions());
        let first = registry.resolve(SensorType::Wifi).unwrap();
        let second = registry.resolve(SensorType::Wifi).unwrap();
        assert!(first.as_pull().is_some());
        assert!(second.as_pull().is_some());
    }

    #[test]
    fn test_resolve_unknown_code() {
        let registry = registry(SimulatedPlatform::with_all_permissions());
        match registry.resolve_code(4999) {
            Err(SenseError::UnknownSensorType(code)) => assert_eq!(code, 4999),
            _ => panic!("expected UnknownSensorType"),
        }
    }

    #[test]
    fn test_name_lookup_surface() {
        assert_eq!(type_of("WiFi").unwrap(), SensorType::Wifi);
        assert_eq!(name_of(5010).unwrap(), "WiFi");
        assert!(matches!(
            name_of(1),
            Err(SenseError::UnknownSensorName(_))
        ));
    }

    #[test]
    fn test_default_config_attached_on_resolve() {
        let registry = registry(SimulatedPlatform::with_all_permissions());
        let handle = registry.resolve(SensorType::Location).unwrap();
        assert_eq!(
            handle.config().millis(crate::config::SENSE_WINDOW_MILLIS),
            Some(Duration::from_secs(30))
        );
    }
}
