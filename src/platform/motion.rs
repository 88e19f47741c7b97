use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::model::AccelSample;
use crate::platform::{Clock, MotionSource};

#[derive(Debug, Default)]
struct SharedState {
    available: bool,
    running: bool,
    update_interval: Option<Duration>,
    latest: Option<AccelSample>,
}

/// Motion source fed by whoever holds a clone of it.
///
/// Samples pushed while the source is stopped are dropped, the same way a
/// real sensor produces nothing until it is started.
#[derive(Debug, Clone)]
pub struct SharedMotion {
    state: Rc<RefCell<SharedState>>,
}

impl SharedMotion {
    pub fn new() -> Self {
        Self::with_availability(true)
    }

    /// A source that reports no accelerometer on this device
    pub fn unavailable() -> Self {
        Self::with_availability(false)
    }

    fn with_availability(available: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(SharedState { available, ..Default::default() })),
        }
    }

    /// Record a new reading; returns false when the source is not running
    pub fn push(&self, sample: AccelSample) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.running {
            return false;
        }
        state.latest = Some(sample);
        true
    }

    pub fn update_interval(&self) -> Option<Duration> {
        self.state.borrow().update_interval
    }

    /// Simulate the accelerometer appearing or going away (permission
    /// revoked, hardware fault). Losing it stops the source.
    pub fn set_available(&self, available: bool) {
        let mut state = self.state.borrow_mut();
        state.available = available;
        if !available {
            state.running = false;
            state.latest = None;
        }
    }
}

impl Default for SharedMotion {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSource for SharedMotion {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    fn start(&mut self, update_interval: Duration) {
        let mut state = self.state.borrow_mut();
        if !state.available {
            return;
        }
        state.running = true;
        state.update_interval = Some(update_interval);
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.running = false;
        state.latest = None;
    }

    fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    fn latest_sample(&self) -> Option<AccelSample> {
        let state = self.state.borrow();
        if state.running { state.latest } else { None }
    }
}

/// Replays a recorded trace against the run loop clock.
///
/// Trace timestamps are relative to the moment the source is started.
pub struct TraceMotion {
    samples: Vec<AccelSample>,
    clock: Clock,
    started_at: Option<Duration>,
    update_interval: Duration,
}

impl TraceMotion {
    /// `samples` must be ordered by timestamp
    pub fn new(samples: Vec<AccelSample>, clock: Clock) -> Self {
        Self {
            samples,
            clock,
            started_at: None,
            update_interval: Duration::ZERO,
        }
    }

    /// Time covered by the trace
    pub fn duration(&self) -> Duration {
        self.samples.last().map(|s| s.timestamp).unwrap_or_default()
    }

    fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        let elapsed = self.clock.now().saturating_sub(started);
        // The sensor only delivers on its own cadence
        if self.update_interval.is_zero() {
            return Some(elapsed);
        }
        let step = self.update_interval.as_nanos();
        Some(Duration::from_nanos((elapsed.as_nanos() / step * step) as u64))
    }
}

impl MotionSource for TraceMotion {
    fn is_available(&self) -> bool {
        !self.samples.is_empty()
    }

    fn start(&mut self, update_interval: Duration) {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
        self.update_interval = update_interval;
    }

    fn stop(&mut self) {
        self.started_at = None;
    }

    fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn latest_sample(&self) -> Option<AccelSample> {
        let elapsed = self.elapsed()?;
        let idx = self.samples.partition_point(|s| s.timestamp <= elapsed);
        idx.checked_sub(1).map(|i| self.samples[i])
    }
}
