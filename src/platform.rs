//! Collaborator boundaries
//!
//! The framework never talks to hardware, telephony or storage directly.
//! A `Platform` hands out per-type samplers and event sources and answers
//! permission checks; a `RecordSink` takes ownership of each emitted record.
//! Push sources deliver events over an mpsc channel rather than re-entrant
//! callbacks, which keeps dedup and shutdown explicit.

use std::sync::mpsc;
use std::time::Duration;

use crate::data::{PlatformEvent, RawPayload, SensorRecord};
use crate::error::SenseError;
use crate::types::SensorType;

/// Raw-event-source collaborator: the platform sensor/telephony/content layer
pub trait Platform: Send + Sync {
    /// Whether the named platform permission is currently granted
    fn is_permission_granted(&self, permission: &str) -> bool;

    /// Build a sampler for one pull sensor type
    fn sampler(&self, sensor_type: SensorType) -> Result<Box<dyn Sampler>, SenseError>;

    /// Build an event source for one push sensor type
    fn event_source(&self, sensor_type: SensorType) -> Result<Box<dyn EventSource>, SenseError>;
}

/// Samples one pull sensor for the duration of a sense window.
///
/// `sample` blocks for the window and returns whatever the platform captured
/// in it. The scheduler owns all timing around the call.
pub trait Sampler: Send {
    fn sample(&mut self, window: Duration) -> RawPayload;
}

/// Platform notification source for one push sensor type.
///
/// While subscribed, the source sends one `PlatformEvent` per notification
/// on the provided channel. `unsubscribe` must synchronously stop delivery
/// and drop the sender before returning, so the receiving side observes the
/// channel closing.
pub trait EventSource: Send {
    fn subscribe(&mut self, events: mpsc::Sender<PlatformEvent>);
    fn unsubscribe(&mut self);
}

/// Record-sink collaborator: storage, upload, or anything downstream.
/// Ownership of each record transfers on emission.
pub trait RecordSink: Send + Sync {
    fn emit(&self, record: SensorRecord);
}

impl RecordSink for mpsc::Sender<SensorRecord> {
    fn emit(&self, record: SensorRecord) {
        // A closed receiver means the consumer shut down first; records
        // emitted after that point have nowhere to go.
        let _ = self.send(record);
    }
}
