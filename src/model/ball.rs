use glam::{Mat4, Vec3};

/// Physical description of the ball dropped onto a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpec {
    pub radius: f32,
    pub mass: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    pub affected_by_gravity: bool,
    /// Height above the hit point at which the ball appears
    pub spawn_lift: f32,
}

impl Default for BallSpec {
    fn default() -> Self {
        Self {
            radius: 0.03,
            mass: 1.0,
            friction: 0.1,
            rolling_friction: 0.1,
            affected_by_gravity: true,
            spawn_lift: 0.01,
        }
    }
}

impl BallSpec {
    /// Spawn point for a hit-test transform: its translation, lifted on Y
    pub fn spawn_position(&self, transform: &Mat4) -> Vec3 {
        transform.w_axis.truncate() + Vec3::Y * self.spawn_lift
    }
}
