use glam::Vec3;

use crate::model::BallSpec;
use crate::platform::PhysicsBody;

/// Dynamic sphere driven by impulses
#[derive(Debug, Clone)]
pub struct BallBody {
    pub spec: BallSpec,
    position: Vec3,
    velocity: Vec3,
    force: Vec3,
    spawn: Vec3,
    resting: bool,
}

impl BallBody {
    pub fn new(spec: BallSpec, position: Vec3) -> Self {
        Self {
            spec,
            position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            spawn: position,
            resting: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Continuous force accumulated since the last `clear_forces`
    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// In contact with a supporting plane after the last step
    pub fn is_resting(&self) -> bool {
        self.resting
    }

    pub fn spawn_position(&self) -> Vec3 {
        self.spawn
    }
}

impl PhysicsBody for BallBody {
    fn clear_forces(&mut self) {
        self.force = Vec3::ZERO;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.spec.mass;
    }
}

/// Integrates ball motion (gravity, plane contact, friction)
pub struct PhysicsSystem {
    pub gravity: f32,
    pub max_fall_speed: f32,
    /// How far below its spawn point a ball may fall before it counts as lost
    pub lost_depth: f32,
}

impl PhysicsSystem {
    pub fn new() -> Self {
        Self {
            gravity: -9.8,
            max_fall_speed: 20.0,
            lost_depth: 10.0,
        }
    }

    /// Advance `ball` by `dt` seconds. `support` is the height of the plane
    /// surface under the ball, if any.
    pub fn step(&self, ball: &mut BallBody, support: Option<f32>, dt: f32) {
        let dt = dt.max(0.0);
        let spec = ball.spec;

        // Accumulated force and gravity
        ball.velocity += ball.force / spec.mass * dt;
        if spec.affected_by_gravity {
            ball.velocity.y += self.gravity * dt;
            ball.velocity.y = ball.velocity.y.max(-self.max_fall_speed);
        }

        let mut new_pos = ball.position + ball.velocity * dt;
        let was_resting = ball.resting;
        ball.resting = false;

        // Resting contact with the plane
        if let Some(height) = support {
            let floor = height + spec.radius;
            if new_pos.y <= floor && ball.velocity.y <= 0.0 {
                new_pos.y = floor;
                ball.velocity.y = 0.0;
                ball.resting = true;

                // Touchdown scrubs some sideways speed
                if !was_resting {
                    ball.velocity.x *= 1.0 - spec.friction;
                    ball.velocity.z *= 1.0 - spec.friction;
                }
            }
        }

        // Rolling friction decelerates, never reverses
        if ball.resting {
            let decel = spec.rolling_friction * self.gravity.abs() * dt;
            let horizontal = Vec3::new(ball.velocity.x, 0.0, ball.velocity.z);
            let speed = horizontal.length();
            if speed <= decel {
                ball.velocity.x = 0.0;
                ball.velocity.z = 0.0;
            } else {
                ball.velocity -= horizontal / speed * decel;
            }
        }

        ball.position = new_pos;
    }

    /// Fell off every plane and kept going
    pub fn is_lost(&self, ball: &BallBody) -> bool {
        ball.position.y < ball.spawn.y - self.lost_depth
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn run(physics: &PhysicsSystem, ball: &mut BallBody, support: Option<f32>, frames: usize) {
        for _ in 0..frames {
            physics.step(ball, support, DT);
        }
    }

    #[test]
    fn test_ball_settles_on_plane() {
        let physics = PhysicsSystem::new();
        let spec = BallSpec::default();
        let mut ball = BallBody::new(spec, Vec3::new(0.0, -1.0 + spec.radius + spec.spawn_lift, 0.0));

        run(&physics, &mut ball, Some(-1.0), 60);
        assert!(ball.is_resting());
        assert!((ball.position().y - (-1.0 + spec.radius)).abs() < 1e-6);
        assert_eq!(ball.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_impulse_rolls_then_friction_stops() {
        let physics = PhysicsSystem::new();
        let spec = BallSpec::default();
        let mut ball = BallBody::new(spec, Vec3::new(0.0, spec.radius, 0.0));
        run(&physics, &mut ball, Some(0.0), 5);

        ball.apply_impulse(Vec3::new(0.2, 0.0, 0.0));
        assert!((ball.velocity().x - 0.2).abs() < 1e-6, "impulse / mass changes velocity at once");

        run(&physics, &mut ball, Some(0.0), 3);
        assert!(ball.position().x > 0.0);
        assert!(ball.velocity().x > 0.0 && ball.velocity().x < 0.2);

        run(&physics, &mut ball, Some(0.0), 120);
        assert_eq!(ball.velocity().x, 0.0, "friction must not reverse motion");
        assert!(ball.position().x > 0.0);
    }

    #[test]
    fn test_heavier_ball_gets_smaller_kick() {
        let spec = BallSpec { mass: 4.0, ..BallSpec::default() };
        let mut ball = BallBody::new(spec, Vec3::ZERO);
        ball.apply_impulse(Vec3::new(0.0, 0.0, -0.2));
        assert!((ball.velocity().z + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_clear_forces_resets_accumulator() {
        let mut ball = BallBody::new(BallSpec::default(), Vec3::ZERO);
        ball.add_force(Vec3::new(1.0, 0.0, 0.0));
        ball.add_force(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(ball.force(), Vec3::new(1.0, 0.0, 2.0));
        ball.clear_forces();
        assert_eq!(ball.force(), Vec3::ZERO);
    }

    #[test]
    fn test_unsupported_ball_falls_and_is_lost() {
        let physics = PhysicsSystem::new();
        let mut ball = BallBody::new(BallSpec::default(), Vec3::ZERO);
        run(&physics, &mut ball, None, 30);
        assert!(!ball.is_resting());
        assert!(ball.velocity().y < 0.0);
        assert!(!physics.is_lost(&ball));

        run(&physics, &mut ball, None, 240);
        assert!(ball.velocity().y >= -physics.max_fall_speed);
        assert!(physics.is_lost(&ball));
    }
}
