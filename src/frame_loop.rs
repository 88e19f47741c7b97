use std::time::Duration;

use crate::controller::InputEvent;
use crate::platform::RunLoop;
use crate::scene::BallScene;

/// Longest step the physics is allowed to take in one frame
pub const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

/// Main loop state: the run loop that ticks steering, and the scene it steers
pub struct FrameLoopContext {
    pub run_loop: RunLoop,
    pub scene: BallScene,
    pending: Vec<InputEvent>,
    frames: u64,
}

impl FrameLoopContext {
    pub fn new(run_loop: RunLoop, scene: BallScene) -> Self {
        Self {
            run_loop,
            scene,
            pending: Vec::new(),
            frames: 0,
        }
    }

    /// Queue an event for the next frame
    pub fn push_event(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    /// Apply queued events, fire due timers, then integrate physics
    pub fn update(&mut self, dt: Duration) {
        let dt = dt.min(MAX_FRAME_STEP);

        for event in self.pending.drain(..) {
            self.scene.process_event(&event);
        }

        self.run_loop.advance(dt);
        self.scene.step(dt.as_secs_f32());
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
