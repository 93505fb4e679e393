//! Push sensors
//!
//! A push sensor is a process-wide singleton wrapping one platform event
//! source. While subscribed, events arrive over an mpsc channel and are
//! drained by a worker thread: each event is deduplicated against the
//! identity of the immediately preceding accepted event, then processed and
//! emitted. The remembered identity and the subscribed flag live behind the
//! same lock consulted by the start/stop control path.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::config::SensorConfig;
use crate::data::PlatformEvent;
use crate::platform::{EventSource, RecordSink};
use crate::processor::Processor;
use crate::types::SensorType;

/// State shared between the drain worker and the control path
struct Session {
    subscribed: bool,
    /// Identity token of the last accepted event, for redelivery suppression
    last_identity: Option<String>,
}

/// Control-path state: the source and the drain worker handle
struct Control {
    source: Box<dyn EventSource>,
    drain: Option<JoinHandle<()>>,
}

pub struct PushSensor {
    sensor_type: SensorType,
    config: SensorConfig,
    processor: Processor,
    session: Arc<Mutex<Session>>,
    control: Mutex<Control>,
}

impl PushSensor {
    pub(crate) fn new(
        sensor_type: SensorType,
        config: SensorConfig,
        source: Box<dyn EventSource>,
    ) -> Self {
        Self {
            sensor_type,
            config,
            processor: Processor::new(sensor_type, true, true),
            session: Arc::new(Mutex::new(Session {
                subscribed: false,
                last_identity: None,
            })),
            control: Mutex::new(Control {
                source,
                drain: None,
            }),
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn log_tag(&self) -> &'static str {
        self.sensor_type.log_tag()
    }

    pub fn config(&self) -> SensorConfig {
        self.config.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.session).subscribed
    }

    /// Subscribe to platform notifications, emitting one record per
    /// accepted (non-redelivered) event. Idempotent while subscribed.
    pub fn start(&self, sink: Arc<dyn RecordSink>) {
        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut session = lock(&self.session);
            if session.subscribed {
                return;
            }
            session.subscribed = true;
            session.last_identity = None;
        }

        let (events_tx, events_rx) = mpsc::channel();
        control.source.subscribe(events_tx);

        let session = Arc::clone(&self.session);
        let processor = self.processor.clone();
        let config = self.config.clone();
        control.drain = Some(thread::spawn(move || {
            drain_events(events_rx, &session, &processor, &config, sink.as_ref());
        }));
    }

    /// Unsubscribe from platform notifications. The source stops delivering
    /// before this returns; events it already delivered are drained, then
    /// the worker exits, so no record is emitted after this call. The dedup
    /// history is cleared; a fresh `start` begins with none.
    pub fn stop(&self) {
        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if !lock(&self.session).subscribed {
            return;
        }

        // Unsubscribing drops the source's sender; the drain loop finishes
        // whatever was already in the channel and exits.
        control.source.unsubscribe();
        if let Some(drain) = control.drain.take() {
            let _ = drain.join();
        }

        let mut session = lock(&self.session);
        session.subscribed = false;
        session.last_identity = None;
    }
}

impl Drop for PushSensor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain_events(
    events: Receiver<PlatformEvent>,
    session: &Mutex<Session>,
    processor: &Processor,
    config: &SensorConfig,
    sink: &dyn RecordSink,
) {
    for event in events {
        {
            let mut session = lock(session);
            if !session.subscribed {
                // Not sensing; the event belongs to no active subscription
                continue;
            }
            if session.last_identity.as_deref() == Some(event.identity.as_str()) {
                // Redelivery of an event already logged
                continue;
            }
            session.last_identity = Some(event.identity.clone());
        }
        let record = processor.process(event.timestamp, event.payload, config);
        sink.emit(record);
    }
}

fn lock(session: &Mutex<Session>) -> std::sync::MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EventKind, RawPayload, SensorRecord};
    use chrono::Utc;
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    /// Event source driven by the test: events are injected by hand through
    /// the sender captured at subscribe time.
    struct ManualSource {
        outlet: Arc<Mutex<Option<Sender<PlatformEvent>>>>,
    }

    impl ManualSource {
        fn new() -> (Self, Arc<Mutex<Option<Sender<PlatformEvent>>>>) {
            let outlet = Arc::new(Mutex::new(None));
            (
                Self {
                    outlet: Arc::clone(&outlet),
                },
                outlet,
            )
        }
    }

    impl EventSource for ManualSource {
        fn subscribe(&mut self, events: Sender<PlatformEvent>) {
            *self.outlet.lock().unwrap() = Some(events);
        }

        fn unsubscribe(&mut self) {
            *self.outlet.lock().unwrap() = None;
        }
    }

    fn sms_event(identity: &str, body: &str) -> PlatformEvent {
        PlatformEvent {
            timestamp: Utc::now(),
            identity: identity.to_string(),
            kind: EventKind::Received,
            payload: RawPayload::Sms {
                body: body.to_string(),
                address: "+15551234".to_string(),
            },
        }
    }

    fn inject(outlet: &Arc<Mutex<Option<Sender<PlatformEvent>>>>, event: PlatformEvent) {
        outlet
            .lock()
            .unwrap()
            .as_ref()
            .expect("source not subscribed")
            .send(event)
            .unwrap();
    }

    fn subscribed_sensor() -> (
        PushSensor,
        Arc<Mutex<Option<Sender<PlatformEvent>>>>,
        mpsc::Receiver<SensorRecord>,
    ) {
        let (source, outlet) = ManualSource::new();
        let sensor = PushSensor::new(
            SensorType::Sms,
            SensorConfig::default_for(SensorType::Sms),
            Box::new(source),
        );
        let (tx, rx) = mpsc::channel();
        sensor.start(Arc::new(tx));
        (sensor, outlet, rx)
    }

    #[test]
    fn test_duplicate_identity_yields_one_record() {
        let (sensor, outlet, rx) = subscribed_sensor();

        inject(&outlet, sms_event("row-7", "first delivery"));
        inject(&outlet, sms_event("row-7", "redelivery"));
        sensor.stop();

        let records: Vec<SensorRecord> = rx.try_iter().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sensor_type, SensorType::Sms);
    }

    #[test]
    fn test_distinct_identities_yield_two_records() {
        let (sensor, outlet, rx) = subscribed_sensor();

        inject(&outlet, sms_event("row-7", "first"));
        inject(&outlet, sms_event("row-8", "second"));
        sensor.stop();

        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_alternating_identities_are_all_accepted() {
        let (sensor, outlet, rx) = subscribed_sensor();

        // Only the immediately preceding accepted identity suppresses
        inject(&outlet, sms_event("row-7", "a"));
        inject(&outlet, sms_event("row-8", "b"));
        inject(&outlet, sms_event("row-7", "c"));
        sensor.stop();

        assert_eq!(rx.try_iter().count(), 3);
    }

    #[test]
    fn test_stop_clears_dedup_history() {
        let (sensor, outlet, rx) = subscribed_sensor();

        inject(&outlet, sms_event("row-7", "before stop"));
        sensor.stop();
        assert_eq!(rx.try_iter().count(), 1);

        let (tx, rx) = mpsc::channel();
        sensor.start(Arc::new(tx));
        inject(&outlet, sms_event("row-7", "after restart"));
        sensor.stop();

        // Same token again, but the restart began with no history
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_no_records_after_stop_returns() {
        let (sensor, outlet, rx) = subscribed_sensor();

        inject(&outlet, sms_event("row-1", "delivered"));
        sensor.stop();
        assert!(!sensor.is_subscribed());

        // The source is unsubscribed; there is no sender left to inject with
        assert!(outlet.lock().unwrap().is_none());
        assert_eq!(rx.try_iter().count(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_start_is_idempotent_while_subscribed() {
        let (sensor, outlet, rx) = subscribed_sensor();
        let (tx2, rx2) = mpsc::channel();
        sensor.start(Arc::new(tx2));

        inject(&outlet, sms_event("row-1", "once"));
        sensor.stop();

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(rx2.try_iter().count(), 0);
    }
}
