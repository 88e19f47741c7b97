use glam::Vec3;
use std::time::Duration;

/// One accelerometer reading, in g (1.0 = standard gravity)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: Duration,
}

impl AccelSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp: Duration) -> Self {
        Self { x, y, z, timestamp }
    }
}

/// Neutral tilt, captured from the first sample a session sees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Baseline {
    pub origin_x: Option<f64>,
    pub origin_z: Option<f64>,
}

impl Baseline {
    /// Fill any unset origin from `sample` and return `(origin_x, origin_z)`.
    /// Origins that are already set are never overwritten.
    pub fn calibrate(&mut self, sample: &AccelSample) -> (f64, f64) {
        let x = *self.origin_x.get_or_insert(sample.x);
        let z = *self.origin_z.get_or_insert(sample.z);
        (x, z)
    }

    pub fn is_calibrated(&self) -> bool {
        self.origin_x.is_some() && self.origin_z.is_some()
    }
}

/// Two-axis impulse handed to the physics body each tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceCommand {
    pub forward: f64,
    pub right: f64,
}

impl ForceCommand {
    pub const NEUTRAL: ForceCommand = ForceCommand { forward: 0.0, right: 0.0 };

    /// World-space impulse: right on X, forward on Z
    pub fn impulse(&self) -> Vec3 {
        Vec3::new(self.right as f32, 0.0, self.forward as f32)
    }
}
