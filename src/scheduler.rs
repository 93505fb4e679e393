//! Duty-cycle scheduling for pull sensors
//!
//! A pull sensor alternates between a sense window (the sampler is active)
//! and a sleep interval (nothing runs). The sleep half is the point of
//! duty-cycling and is always honored; a stop request only shortens it, it
//! never skips a window already in progress. Multi-cycle sensors carry a
//! bounded cycle counter and go idle on their own once it is reached.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use crate::config::{
    SensorConfig, ADAPTIVE_SENSING_ENABLED, NUMBER_OF_CYCLES, POST_SENSE_SLEEP_MILLIS,
    SENSE_WINDOW_MILLIS, SENSE_WINDOW_PER_CYCLE_MILLIS,
};
use crate::platform::{RecordSink, Sampler};
use crate::processor::Processor;

/// Fallbacks for configs missing a timing parameter
const DEFAULT_SENSE_WINDOW: Duration = Duration::from_secs(10);
const DEFAULT_SLEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Phase of one pull sensor's duty cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Sensing,
    Sleeping,
}

/// Duty-cycle descriptor resolved from a sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycle {
    pub sense_window: Duration,
    pub sleep_interval: Duration,
    /// `Some(n)` for bounded multi-cycle sensors, `None` for unbounded ones
    pub cycles: Option<u32>,
    pub adaptive: bool,
}

impl DutyCycle {
    pub fn from_config(config: &SensorConfig) -> Self {
        let cycles = config.count(NUMBER_OF_CYCLES);
        let sense_window = if cycles.is_some() {
            config.millis(SENSE_WINDOW_PER_CYCLE_MILLIS)
        } else {
            config.millis(SENSE_WINDOW_MILLIS)
        }
        .unwrap_or(DEFAULT_SENSE_WINDOW);

        Self {
            sense_window,
            sleep_interval: config
                .millis(POST_SENSE_SLEEP_MILLIS)
                .unwrap_or(DEFAULT_SLEEP_INTERVAL),
            cycles,
            adaptive: config.flag(ADAPTIVE_SENSING_ENABLED).unwrap_or(false),
        }
    }
}

/// Hook for substituting a new sleep duration between cycles.
///
/// Consulted only when adaptive sensing is enabled; the recomputation policy
/// itself belongs to the caller.
pub trait SleepPolicy: Send {
    fn next_sleep(&mut self, current: Duration) -> Duration;
}

struct DriverState {
    phase: CycleState,
    stop_requested: bool,
    completed_cycles: u32,
}

/// Shared handle between a running duty-cycle thread and its controller
pub(crate) struct CycleShared {
    state: Mutex<DriverState>,
    wake: Condvar,
}

impl CycleShared {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(DriverState {
                phase: CycleState::Idle,
                stop_requested: false,
                completed_cycles: 0,
            }),
            wake: Condvar::new(),
        }
    }

    pub(crate) fn phase(&self) -> CycleState {
        self.lock().phase
    }

    pub(crate) fn completed_cycles(&self) -> u32 {
        self.lock().completed_cycles
    }

    /// Ask the running cycle to stop. Ends a Sleeping phase promptly; a
    /// Sensing window already in progress completes first.
    pub(crate) fn request_stop(&self) {
        self.lock().stop_requested = true;
        self.wake.notify_all();
    }

    /// Prepare for a fresh run
    pub(crate) fn reset(&self) {
        let mut state = self.lock();
        state.stop_requested = false;
        state.completed_cycles = 0;
        state.phase = CycleState::Idle;
    }

    fn set_phase(&self, phase: CycleState) {
        self.lock().phase = phase;
    }

    fn stop_requested(&self) -> bool {
        self.lock().stop_requested
    }

    fn complete_cycle(&self) -> u32 {
        let mut state = self.lock();
        state.completed_cycles += 1;
        state.completed_cycles
    }

    /// Sleep for `interval` unless a stop request arrives first.
    /// Returns true when the sleep was cut short by a stop.
    fn sleep_interruptibly(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut state = self.lock();
        while !state.stop_requested {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .wake
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The duty-cycle loop body, run on a pull sensor's worker thread.
///
/// Each iteration samples one window, hands the result to the processor and
/// emits the record, then sleeps. Bounded cycles end the loop on their own;
/// a stop request ends it at the next phase boundary.
pub(crate) fn run_duty_cycle(
    duty: DutyCycle,
    shared: &CycleShared,
    sampler: &mut dyn Sampler,
    processor: &Processor,
    config: &SensorConfig,
    sink: &dyn RecordSink,
    mut policy: Option<Box<dyn SleepPolicy>>,
) {
    let mut sleep_interval = duty.sleep_interval;
    loop {
        shared.set_phase(CycleState::Sensing);
        let payload = sampler.sample(duty.sense_window);
        let record = processor.process(Utc::now(), payload, config);
        sink.emit(record);

        let completed = shared.complete_cycle();
        if let Some(bound) = duty.cycles {
            if completed >= bound {
                break;
            }
        }
        if shared.stop_requested() {
            break;
        }

        if duty.adaptive {
            if let Some(policy) = policy.as_mut() {
                sleep_interval = policy.next_sleep(sleep_interval);
            }
        }

        shared.set_phase(CycleState::Sleeping);
        if shared.sleep_interruptibly(sleep_interval) {
            break;
        }
    }
    shared.set_phase(CycleState::Idle);
}
