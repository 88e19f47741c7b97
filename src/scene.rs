use glam::{Vec2, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::{BallBody, InputEvent, PhysicsSystem, SteeringController};
use crate::model::{BallSpec, Camera, PlaneMap, Ray};
use crate::platform::HitTestProvider;

/// Detected planes, the current ball and the steering that drives it
pub struct BallScene {
    planes: PlaneMap,
    spec: BallSpec,
    physics: PhysicsSystem,
    ball: Option<Rc<RefCell<BallBody>>>,
    steering: SteeringController,
    camera: Camera,
    viewport: Vec2,
}

impl BallScene {
    pub fn new(steering: SteeringController, spec: BallSpec, viewport: Vec2) -> Self {
        Self {
            planes: PlaneMap::new(),
            spec,
            physics: PhysicsSystem::new(),
            ball: None,
            steering,
            camera: Camera::new(viewport.x as u32, viewport.y as u32),
            viewport,
        }
    }

    /// Process a platform event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::TouchEnded { x, y } => {
                self.place_ball_at(Vec2::new(*x, *y));
            }
            InputEvent::PlaneAdded(plane) => self.planes.add(*plane),
            InputEvent::PlaneUpdated(plane) => self.planes.update(*plane),
            InputEvent::PlaneRemoved(anchor) => {
                self.planes.remove(*anchor);
            }
            InputEvent::Resized { width, height } => {
                self.viewport = Vec2::new(*width, *height);
                self.camera.set_aspect(*width as u32, *height as u32);
            }
            InputEvent::Reload => self.reload(),
            InputEvent::VisibilityChanged { visible: true } => self.reload(),
            InputEvent::VisibilityChanged { visible: false } => self.pause(),
        }
    }

    /// Drop a ball where a touch (in view pixels) meets a detected plane
    pub fn place_ball_at(&mut self, touch: Vec2) -> Option<Rc<RefCell<BallBody>>> {
        let ray = self.camera.screen_ray(touch, self.viewport);
        self.place_ball(&ray)
    }

    /// Replace the current ball with a new one where `ray` hits a plane.
    /// A miss leaves the scene untouched.
    pub fn place_ball(&mut self, ray: &Ray) -> Option<Rc<RefCell<BallBody>>> {
        let Some(transform) = self.planes.hit_test(ray) else {
            tracing::debug!("touch missed every plane");
            return None;
        };

        if self.ball.take().is_some() {
            tracing::debug!("previous ball removed");
        }

        let position = self.spec.spawn_position(&transform);
        let ball = Rc::new(RefCell::new(BallBody::new(self.spec, position)));
        let steered = self.steering.start_session(ball.clone());
        tracing::info!(?position, steered, "ball placed");

        self.ball = Some(ball.clone());
        Some(ball)
    }

    /// Advance ball physics by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let Some(ball) = self.ball.clone() else { return };

        let lost = {
            let mut body = ball.borrow_mut();
            // Looked up from the centre: a ball spawned with its bottom inside
            // the surface is still supported and settles onto it
            let support = self.planes.support_below(body.position()).map(|p| p.height());
            self.physics.step(&mut body, support, dt);
            self.physics.is_lost(&body)
        };

        if lost {
            tracing::warn!("ball fell off the planes, removing it");
            self.ball = None;
            self.steering.end_session();
        }
    }

    /// Forget all planes and the ball
    pub fn reload(&mut self) {
        self.planes.clear();
        self.ball = None;
        self.steering.stop();
        tracing::info!("scene reloaded");
    }

    /// View went away: stop ticking and halt the sensor
    pub fn pause(&mut self) {
        self.steering.stop();
    }

    pub fn ball(&self) -> Option<Rc<RefCell<BallBody>>> {
        self.ball.clone()
    }

    pub fn ball_position(&self) -> Option<Vec3> {
        self.ball.as_ref().map(|b| b.borrow().position())
    }

    pub fn planes(&self) -> &PlaneMap {
        &self.planes
    }

    pub fn steering(&self) -> &SteeringController {
        &self.steering
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteeringConfig;
    use crate::model::{AccelSample, DetectedPlane, PlaneId};
    use crate::platform::{MotionSource, PhysicsBody, RunLoop, SharedMotion};
    use std::time::Duration;

    const VIEW: Vec2 = Vec2::new(400.0, 800.0);

    fn floor() -> DetectedPlane {
        DetectedPlane::new(PlaneId(7), Vec3::new(0.0, -1.0, -1.0), Vec2::new(2.0, 2.0))
    }

    fn scene(motion: SharedMotion, run_loop: &RunLoop) -> BallScene {
        let steering = SteeringController::new(motion, run_loop.clone(), SteeringConfig::default());
        let mut scene = BallScene::new(steering, BallSpec::default(), VIEW);
        scene.camera_mut().set_look_at(Vec3::new(0.0, -1.0, -1.0));
        scene.process_event(&InputEvent::PlaneAdded(floor()));
        scene
    }

    #[test]
    fn test_touch_places_ball_above_plane() {
        let run_loop = RunLoop::new();
        let mut scene = scene(SharedMotion::new(), &run_loop);

        scene.process_event(&InputEvent::touch(VIEW * 0.5));
        let pos = scene.ball_position().expect("center touch hits the floor");
        assert!((pos - Vec3::new(0.0, -0.99, -1.0)).length() < 1e-3, "got {pos:?}");
        assert!(scene.steering().is_active());
    }

    #[test]
    fn test_touch_outside_planes_keeps_ball() {
        let run_loop = RunLoop::new();
        let mut scene = scene(SharedMotion::new(), &run_loop);
        let first = scene.place_ball_at(VIEW * 0.5).unwrap();

        // Top edge of the view looks over the plane
        assert!(scene.place_ball_at(Vec2::new(200.0, 0.0)).is_none());
        assert!(Rc::ptr_eq(&scene.ball().unwrap(), &first));
    }

    #[test]
    fn test_new_ball_replaces_old_and_its_session() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut scene = scene(motion.clone(), &run_loop);

        let first = scene.place_ball_at(VIEW * 0.5).unwrap();
        let second = scene.place_ball_at(Vec2::new(220.0, 420.0)).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(scene.steering().sessions_started(), 2);
        assert_eq!(run_loop.active_timers(), 1);
    }

    fn assert_resting_on_floor(ball: &BallBody) {
        let expected = floor().height() + ball.spec.radius;
        assert!(ball.is_resting(), "ball should rest on the floor: {:?}", ball.position());
        assert!((ball.position().y - expected).abs() < 1e-4, "got {:?}", ball.position());
    }

    #[test]
    fn test_placed_ball_settles_on_plane() {
        let run_loop = RunLoop::new();
        let mut scene = scene(SharedMotion::new(), &run_loop);
        let ball = scene.place_ball_at(VIEW * 0.5).unwrap();
        // Spawned with its bottom below the surface
        assert!(ball.borrow().position().y - ball.borrow().spec.radius < floor().height());

        for _ in 0..60 {
            scene.step(1.0 / 60.0);
        }
        assert!(scene.ball().is_some());
        assert_resting_on_floor(&ball.borrow());
        let pos = ball.borrow().position();
        assert!(pos.x.abs() < 1e-4 && (pos.z + 1.0).abs() < 1e-4, "ball drifted: {pos:?}");
    }

    #[test]
    fn test_tilt_moves_ball_forward() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut scene = scene(motion.clone(), &run_loop);
        let ball = scene.place_ball_at(VIEW * 0.5).unwrap();
        scene.step(1.0 / 60.0);
        assert_resting_on_floor(&ball.borrow());
        let start = scene.ball_position().unwrap();

        motion.push(AccelSample::new(0.0, -1.0, 0.0, Duration::ZERO));
        let frame = Duration::from_millis(16);
        for i in 0..120 {
            if i == 10 {
                motion.push(AccelSample::new(0.0, -1.0, -0.4, frame * i));
            }
            run_loop.advance(frame);
            scene.step(frame.as_secs_f32());
        }

        let end = scene.ball_position().unwrap();
        assert!(end.z < start.z - 0.05, "held forward tilt should roll towards -Z: {start:?} -> {end:?}");
        assert!((end.x - start.x).abs() < 1e-4);
        assert_resting_on_floor(&ball.borrow());
    }

    #[test]
    fn test_ball_rolling_off_is_removed() {
        const STEPS: usize = 60 * 4;

        // Left alone, the ball stays put for the whole run
        let run_loop = RunLoop::new();
        let mut still = scene(SharedMotion::new(), &run_loop);
        let ball = still.place_ball_at(VIEW * 0.5).unwrap();
        for _ in 0..STEPS {
            still.step(1.0 / 60.0);
        }
        assert!(still.ball().is_some());
        assert_resting_on_floor(&ball.borrow());

        // Pushed sideways, it leaves the 2 m wide floor and is dropped
        let run_loop = RunLoop::new();
        let mut pushed = scene(SharedMotion::new(), &run_loop);
        let ball = pushed.place_ball_at(VIEW * 0.5).unwrap();
        ball.borrow_mut().apply_impulse(Vec3::new(5.0, 0.0, 0.0));
        for _ in 0..STEPS {
            pushed.step(1.0 / 60.0);
        }
        assert!(pushed.ball().is_none());
        assert!(!pushed.steering().is_active());
    }

    #[test]
    fn test_reload_and_visibility() {
        let run_loop = RunLoop::new();
        let motion = SharedMotion::new();
        let mut scene = scene(motion.clone(), &run_loop);
        scene.place_ball_at(VIEW * 0.5).unwrap();

        scene.process_event(&InputEvent::VisibilityChanged { visible: false });
        assert!(!scene.steering().is_active());
        assert!(!motion.is_running());

        scene.process_event(&InputEvent::VisibilityChanged { visible: true });
        assert!(scene.planes().is_empty());
        assert!(scene.ball().is_none());
        assert!(!motion.is_running());

        scene.process_event(&InputEvent::PlaneAdded(floor()));
        scene.process_event(&InputEvent::PlaneRemoved(PlaneId(7)));
        assert!(scene.place_ball_at(VIEW * 0.5).is_none());
    }
}
