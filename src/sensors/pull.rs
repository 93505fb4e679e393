//! Pull sensors
//!
//! A pull sensor owns a duty-cycle worker thread. `start` asks the platform
//! for a fresh sampler and spawns the loop; `stop` wakes a sleeping cycle
//! and joins the worker. Instances are created per request by the registry,
//! so holding one is holding the whole lifecycle.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::SensorConfig;
use crate::error::SenseError;
use crate::platform::{Platform, RecordSink};
use crate::processor::Processor;
use crate::scheduler::{run_duty_cycle, CycleShared, CycleState, DutyCycle, SleepPolicy};
use crate::types::SensorType;

pub struct PullSensor {
    sensor_type: SensorType,
    config: SensorConfig,
    platform: Arc<dyn Platform>,
    include_raw: bool,
    include_processed: bool,
    shared: Arc<CycleShared>,
    worker: Option<JoinHandle<()>>,
}

impl PullSensor {
    pub(crate) fn new(
        sensor_type: SensorType,
        config: SensorConfig,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            sensor_type,
            config,
            platform,
            include_raw: true,
            include_processed: true,
            shared: Arc::new(CycleShared::new()),
            worker: None,
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn log_tag(&self) -> &'static str {
        self.sensor_type.log_tag()
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent runs. A cycle already
    /// running keeps the snapshot it started with.
    pub fn set_config(&mut self, config: SensorConfig) {
        self.config = config;
    }

    /// Choose which payloads future records carry
    pub fn set_data_toggles(&mut self, include_raw: bool, include_processed: bool) {
        self.include_raw = include_raw;
        self.include_processed = include_processed;
    }

    /// The duty-cycle descriptor resolved from the current configuration
    pub fn duty_cycle(&self) -> DutyCycle {
        DutyCycle::from_config(&self.config)
    }

    /// Current phase of the duty cycle
    pub fn state(&self) -> CycleState {
        self.shared.phase()
    }

    /// Sense windows completed in the current or most recent run
    pub fn completed_cycles(&self) -> u32 {
        self.shared.completed_cycles()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Begin duty-cycled sampling, emitting each window's record to `sink`
    pub fn start(&mut self, sink: Arc<dyn RecordSink>) -> Result<(), SenseError> {
        self.start_with_policy(sink, None)
    }

    /// Like `start`, with an adaptive sleep policy. The policy is consulted
    /// between cycles only when the configuration enables adaptive sensing.
    pub fn start_with_policy(
        &mut self,
        sink: Arc<dyn RecordSink>,
        policy: Option<Box<dyn SleepPolicy>>,
    ) -> Result<(), SenseError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let mut sampler = self.platform.sampler(self.sensor_type)?;
        let processor = Processor::new(self.sensor_type, self.include_raw, self.include_processed);
        let duty = self.duty_cycle();
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        shared.reset();

        self.worker = Some(thread::spawn(move || {
            run_duty_cycle(
                duty,
                &shared,
                sampler.as_mut(),
                &processor,
                &config,
                sink.as_ref(),
                policy,
            );
        }));
        Ok(())
    }

    /// Stop sampling. A Sleeping phase ends promptly; a Sensing window in
    /// progress completes and its record is still emitted.
    pub fn stop(&mut self) {
        self.shared.request_stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    /// A bounded run that has gone Idle on its own leaves a finished worker
    /// behind; reap it so the sensor can be started again.
    pub fn reap_if_idle(&mut self) {
        if self.state() == CycleState::Idle {
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
        }
    }
}

impl Drop for PullSensor {
    fn drop(&mut self) {
        self.stop();
    }
}
