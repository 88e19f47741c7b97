use std::cell::RefCell;
use std::rc::Rc;

use crate::config::SteeringConfig;
use crate::controller::steering::{DirectionState, SteeringSession};
use crate::platform::{MotionSource, PhysicsBody, RunLoop, TimerHandle};

struct ActiveSession {
    id: u64,
    timer: TimerHandle,
    session: Rc<RefCell<SteeringSession>>,
}

/// Drives at most one [`SteeringSession`] from a polled motion source.
///
/// Starting a session replaces the previous one: its timer is invalidated
/// before the new timer is registered, so a replaced body never receives
/// another command. Sensor updates are started with the first session and
/// stopped by [`stop`](Self::stop) or on drop.
pub struct SteeringController {
    motion: Rc<RefCell<dyn MotionSource>>,
    run_loop: RunLoop,
    config: SteeringConfig,
    active: Option<ActiveSession>,
    sessions_started: u64,
    /// Ticks of sessions that have already ended
    finished_ticks: u64,
}

impl SteeringController {
    pub fn new<M>(motion: M, run_loop: RunLoop, config: SteeringConfig) -> Self
    where
        M: MotionSource + 'static,
    {
        Self {
            motion: Rc::new(RefCell::new(motion)),
            run_loop,
            config,
            active: None,
            sessions_started: 0,
            finished_ticks: 0,
        }
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Begin steering `body`. Any previous session ends first, so its body
    /// receives no further commands. Returns false, and schedules nothing,
    /// when the device has no accelerometer.
    pub fn start_session(&mut self, body: Rc<RefCell<dyn PhysicsBody>>) -> bool {
        self.end_session();

        if !self.motion.borrow().is_available() {
            tracing::debug!("accelerometer unavailable, steering disabled");
            return false;
        }

        {
            let mut motion = self.motion.borrow_mut();
            if !motion.is_running() {
                motion.start(self.config.sample_interval);
                tracing::debug!(interval = ?self.config.sample_interval, "accelerometer updates started");
            }
        }

        let session = Rc::new(RefCell::new(SteeringSession::new(body, self.config.force_factor)));
        session.borrow_mut().begin();

        let motion = self.motion.clone();
        let ticking = session.clone();
        let timer = self.run_loop.schedule_repeating(self.config.tick_interval, move || {
            let sample = motion.borrow().latest_sample();
            ticking.borrow_mut().tick(sample);
        });

        self.sessions_started += 1;
        let id = self.sessions_started;
        tracing::info!(session = id, tick = ?self.config.tick_interval, "steering session started");

        self.active = Some(ActiveSession { id, timer, session });
        true
    }

    /// Stop ticking the current session; the sensor keeps running
    pub fn end_session(&mut self) {
        if let Some(active) = self.active.take() {
            active.timer.invalidate();
            let ticks = active.session.borrow().ticks();
            self.finished_ticks += ticks;
            tracing::debug!(session = active.id, ticks, "steering session ended");
        }
    }

    /// End the session and halt sensor updates
    pub fn stop(&mut self) {
        self.end_session();
        let mut motion = self.motion.borrow_mut();
        if motion.is_running() {
            motion.stop();
            tracing::debug!("accelerometer updates stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<Rc<RefCell<SteeringSession>>> {
        self.active.as_ref().map(|a| a.session.clone())
    }

    /// Ticks that issued a command in the current session
    pub fn tick_count(&self) -> u64 {
        self.active.as_ref().map(|a| a.session.borrow().ticks()).unwrap_or(0)
    }

    /// Ticks that issued a command across every session, ended ones included
    pub fn total_ticks(&self) -> u64 {
        self.finished_ticks + self.tick_count()
    }

    /// Latched axes of the current session
    pub fn direction(&self) -> Option<DirectionState> {
        self.active.as_ref().map(|a| a.session.borrow().direction())
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    pub fn motion_running(&self) -> bool {
        self.motion.borrow().is_running()
    }
}

impl Drop for SteeringController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::steering::tests::RecordingBody;
    use crate::model::{AccelSample, ForceCommand};
    use crate::platform::SharedMotion;
    use glam::Vec3;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(100);

    fn config() -> SteeringConfig {
        SteeringConfig {
            tick_interval: TICK,
            ..SteeringConfig::default()
        }
    }

    fn body() -> Rc<RefCell<RecordingBody>> {
        Rc::new(RefCell::new(RecordingBody::default()))
    }

    fn sample(x: f64, z: f64) -> AccelSample {
        AccelSample::new(x, -1.0, z, Duration::ZERO)
    }

    #[test]
    fn test_unavailable_sensor_is_noop() {
        let run_loop = RunLoop::new();
        let mut controller = SteeringController::new(SharedMotion::unavailable(), run_loop.clone(), config());
        let ball = body();

        assert!(!controller.start_session(ball.clone()));
        assert!(!controller.is_active());
        assert_eq!(run_loop.active_timers(), 0);

        run_loop.advance(Duration::from_secs(2));
        assert_eq!(ball.borrow().clears, 0);
        assert!(ball.borrow().impulses.is_empty());
    }

    #[test]
    fn test_losing_sensor_still_ends_previous_session() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
        let first = body();
        assert!(controller.start_session(first.clone()));
        motion.push(sample(0.0, 0.0));
        run_loop.run_pending();
        let calls = first.borrow().impulses.len();

        motion.set_available(false);
        assert!(!controller.start_session(body()));
        assert!(!controller.is_active());
        assert_eq!(run_loop.active_timers(), 0);

        run_loop.advance(TICK * 5);
        assert_eq!(first.borrow().impulses.len(), calls, "dropped body kept receiving commands");
    }

    #[test]
    fn test_total_ticks_survive_session_end() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
        controller.start_session(body());
        motion.push(sample(0.0, 0.0));
        // Fires at 0, 100, 200 and 300 ms
        run_loop.advance(TICK * 3);
        assert_eq!(controller.tick_count(), 4);

        controller.end_session();
        assert_eq!(controller.tick_count(), 0);
        assert_eq!(controller.total_ticks(), 4);

        controller.start_session(body());
        motion.push(sample(0.0, 0.0));
        run_loop.run_pending();
        assert_eq!(controller.total_ticks(), 5);
    }

    #[test]
    fn test_ticks_follow_tick_interval_not_sample_rate() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
        let ball = body();

        assert!(controller.start_session(ball.clone()));
        assert!(motion.is_running());
        assert_eq!(motion.update_interval(), Some(config().sample_interval));
        // Neutral impulse on start
        assert_eq!(ball.borrow().impulses, vec![Vec3::ZERO]);

        // ~60 samples per second pushed, ten ticks per second evaluated
        for _ in 0..60 {
            motion.push(sample(0.0, 0.0));
            run_loop.advance(Duration::from_millis(16));
        }
        assert_eq!(controller.tick_count(), 10);
        assert_eq!(ball.borrow().impulses.len(), 11);
    }

    #[test]
    fn test_no_sample_yet_means_no_command() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
        let ball = body();
        controller.start_session(ball.clone());

        run_loop.advance(TICK * 3);
        assert_eq!(controller.tick_count(), 0);
        assert_eq!(ball.borrow().impulses.len(), 1, "only the neutral start impulse");
    }

    #[test]
    fn test_replacement_silences_previous_body() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());

        let first = body();
        controller.start_session(first.clone());
        motion.push(sample(0.0, 0.0));
        run_loop.advance(TICK);
        let first_calls = first.borrow().impulses.len();
        assert!(first_calls > 1);

        let second = body();
        controller.start_session(second.clone());
        assert_eq!(run_loop.active_timers(), 1);
        assert_eq!(controller.sessions_started(), 2);

        motion.push(sample(0.0, -0.5));
        run_loop.advance(TICK * 5);
        assert_eq!(first.borrow().impulses.len(), first_calls, "stale session kept ticking");
        assert!(second.borrow().impulses.len() > 1);

        // The new session calibrated against its own first sample
        let session = controller.session().unwrap();
        assert_eq!(session.borrow().baseline().origin_z, Some(-0.5));
        assert_eq!(session.borrow().last_command(), Some(ForceCommand::NEUTRAL));
    }

    #[test]
    fn test_stop_halts_timer_and_sensor() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
        let ball = body();
        controller.start_session(ball.clone());
        motion.push(sample(0.0, 0.0));
        run_loop.run_pending();

        controller.stop();
        assert!(!controller.is_active());
        assert!(!controller.motion_running());
        assert!(!motion.push(sample(0.0, -1.0)));

        let calls = ball.borrow().impulses.len();
        run_loop.advance(TICK * 10);
        assert_eq!(ball.borrow().impulses.len(), calls);
    }

    #[test]
    fn test_drop_stops_sensor() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        {
            let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
            controller.start_session(body());
            assert!(motion.is_running());
        }
        assert!(!motion.is_running());
        assert_eq!(run_loop.active_timers(), 0);
    }

    #[test]
    fn test_held_tilt_reissues_same_impulse() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut controller = SteeringController::new(motion.clone(), run_loop.clone(), config());
        let ball = body();
        controller.start_session(ball.clone());

        motion.push(sample(0.0, 0.0));
        run_loop.run_pending();
        motion.push(sample(0.0, -0.4));
        run_loop.advance(TICK * 3);

        let impulses = ball.borrow().impulses.clone();
        assert_eq!(&impulses[2..], &[Vec3::new(0.0, 0.0, -0.2); 3]);
    }
}
