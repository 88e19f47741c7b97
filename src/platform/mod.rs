// PLATFORM: Collaborators the steering loop talks to
pub mod run_loop;
pub mod motion;
#[cfg(target_arch = "wasm32")]
pub mod web;

use glam::{Mat4, Vec3};
use std::time::Duration;

use crate::model::{AccelSample, Ray};

pub use run_loop::{Clock, RunLoop, TimerHandle};
pub use motion::{SharedMotion, TraceMotion};

/// Accelerometer that is polled for its most recent reading
pub trait MotionSource {
    fn is_available(&self) -> bool;
    fn start(&mut self, update_interval: Duration);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    /// Latest sample since `start`, `None` before the first one arrives
    fn latest_sample(&self) -> Option<AccelSample>;
}

/// Dynamic rigid body that accepts impulses
pub trait PhysicsBody {
    fn clear_forces(&mut self);
    fn apply_impulse(&mut self, impulse: Vec3);
}

/// Maps a world ray onto detected geometry
pub trait HitTestProvider {
    /// World transform of the nearest hit, translation in the last column
    fn hit_test(&self, ray: &Ray) -> Option<Mat4>;
}
