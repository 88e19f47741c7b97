use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Shortest interval a repeating timer may use
pub const MIN_TIMER_INTERVAL: Duration = Duration::from_millis(1);

struct Timer {
    id: u64,
    interval: Duration,
    next_fire: Duration,
    valid: Rc<Cell<bool>>,
    // Taken out while the callback runs
    callback: Option<Box<dyn FnMut()>>,
}

#[derive(Default)]
struct Timers {
    next_id: u64,
    entries: Vec<Timer>,
}

/// Single-threaded cooperative scheduler with a manually advanced clock.
///
/// Everything scheduled here runs on the thread that calls [`RunLoop::advance`],
/// so callbacks can share state through `Rc<RefCell<_>>` without locking.
#[derive(Clone, Default)]
pub struct RunLoop {
    now: Rc<Cell<Duration>>,
    timers: Rc<RefCell<Timers>>,
}

/// Cancels a repeating timer
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    valid: Rc<Cell<bool>>,
}

impl TimerHandle {
    /// The callback never runs again after this returns
    pub fn invalidate(&self) {
        self.valid.set(false);
    }

    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Read-only view of the run loop's time
#[derive(Debug, Clone)]
pub struct Clock {
    now: Rc<Cell<Duration>>,
}

impl Clock {
    pub fn now(&self) -> Duration {
        self.now.get()
    }
}

impl RunLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn clock(&self) -> Clock {
        Clock { now: self.now.clone() }
    }

    /// Register `callback` to fire now and then every `interval`.
    /// The first call happens on the next [`advance`](Self::advance).
    pub fn schedule_repeating<F>(&self, interval: Duration, callback: F) -> TimerHandle
    where
        F: FnMut() + 'static,
    {
        let interval = if interval < MIN_TIMER_INTERVAL {
            tracing::warn!(?interval, "timer interval too short, clamping");
            MIN_TIMER_INTERVAL
        } else {
            interval
        };

        let mut timers = self.timers.borrow_mut();
        let id = timers.next_id;
        timers.next_id += 1;
        let valid = Rc::new(Cell::new(true));
        timers.entries.push(Timer {
            id,
            interval,
            next_fire: self.now.get(),
            valid: valid.clone(),
            callback: Some(Box::new(callback)),
        });
        TimerHandle { id, valid }
    }

    /// Number of timers that may still fire
    pub fn active_timers(&self) -> usize {
        self.timers.borrow().entries.iter().filter(|t| t.valid.get()).count()
    }

    /// Fire timers that are already due without moving the clock
    pub fn run_pending(&self) {
        self.advance(Duration::ZERO);
    }

    /// Move the clock forward by `dt`, firing due timers in deadline order.
    /// A timer that is several intervals behind fires once per missed interval.
    pub fn advance(&self, dt: Duration) {
        let target = self.now.get() + dt;

        while let Some((id, fire_at, mut callback)) = self.take_next_due(target) {
            if fire_at > self.now.get() {
                self.now.set(fire_at);
            }
            callback();

            let mut timers = self.timers.borrow_mut();
            if let Some(timer) = timers.entries.iter_mut().find(|t| t.id == id) {
                timer.callback = Some(callback);
            }
        }

        self.now.set(target);
        self.prune();
    }

    fn take_next_due(&self, target: Duration) -> Option<(u64, Duration, Box<dyn FnMut()>)> {
        let mut timers = self.timers.borrow_mut();
        let timer = timers
            .entries
            .iter_mut()
            .filter(|t| t.valid.get() && t.callback.is_some() && t.next_fire <= target)
            .min_by_key(|t| (t.next_fire, t.id))?;

        let fire_at = timer.next_fire;
        timer.next_fire += timer.interval;
        let callback = timer.callback.take()?;
        Some((timer.id, fire_at, callback))
    }

    fn prune(&self) {
        self.timers.borrow_mut().entries.retain(|t| t.valid.get());
    }
}
