use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::axis::{Axis, AxisChannel, Edge};
use crate::model::{AccelSample, Baseline, ForceCommand};
use crate::platform::PhysicsBody;

/// Which axes are currently latched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionState {
    pub applied_forward: bool,
    pub applied_right: bool,
}

/// Steering state for one placed ball.
///
/// Owns the calibration baseline and both axis latches, and pushes a
/// [`ForceCommand`] into its body on every tick that has a sample.
pub struct SteeringSession {
    force_factor: f64,
    baseline: Baseline,
    forward: AxisChannel,
    right: AxisChannel,
    body: Rc<RefCell<dyn PhysicsBody>>,
    ticks: u64,
    last_command: Option<ForceCommand>,
}

impl SteeringSession {
    pub fn new(body: Rc<RefCell<dyn PhysicsBody>>, force_factor: f64) -> Self {
        Self {
            force_factor,
            baseline: Baseline::default(),
            forward: AxisChannel::new(Axis::ForwardBack),
            right: AxisChannel::new(Axis::RightLeft),
            body,
            ticks: 0,
            last_command: None,
        }
    }

    /// Settle the body with a neutral impulse before the first tick
    pub fn begin(&mut self) {
        self.apply(ForceCommand::NEUTRAL);
    }

    /// Run one tick. Without a sample nothing happens and `None` is returned.
    pub fn tick(&mut self, sample: Option<AccelSample>) -> Option<ForceCommand> {
        let sample = sample?;
        let command = self.evaluate(&sample);
        self.apply(command);
        self.ticks += 1;
        self.last_command = Some(command);
        Some(command)
    }

    /// Update baseline and latches from `sample` and return the command to issue.
    pub fn evaluate(&mut self, sample: &AccelSample) -> ForceCommand {
        let (origin_x, origin_z) = self.baseline.calibrate(sample);
        let forward_condition = origin_z > sample.z;
        let right_condition = origin_x > sample.x;
        let force_factor = self.force_factor;

        for (channel, condition) in [
            (&mut self.forward, forward_condition),
            (&mut self.right, right_condition),
        ] {
            if let Some(edge) = channel.update(condition, force_factor) {
                log_edge(channel.axis(), edge);
            }
        }

        ForceCommand {
            forward: self.forward.current(),
            right: self.right.current(),
        }
    }

    fn apply(&self, command: ForceCommand) {
        let mut body = self.body.borrow_mut();
        body.clear_forces();
        body.apply_impulse(command.impulse());
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn direction(&self) -> DirectionState {
        DirectionState {
            applied_forward: self.forward.is_latched(),
            applied_right: self.right.is_latched(),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_command(&self) -> Option<ForceCommand> {
        self.last_command
    }

    pub fn force_factor(&self) -> f64 {
        self.force_factor
    }
}

fn log_edge(axis: Axis, edge: Edge) {
    tracing::debug!(direction = axis.edge_label(edge), "steering edge");
}
