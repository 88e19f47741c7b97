// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod config;
pub mod error;
pub mod trace;
pub mod scene;
pub mod frame_loop;

// MVC-style layout, platform collaborators behind traits
pub mod model;
pub mod controller;
pub mod platform;

pub use config::SteeringConfig;
pub use controller::{SteeringController, SteeringSession};
pub use error::{ConfigError, TraceError};
pub use frame_loop::FrameLoopContext;
pub use model::{AccelSample, Baseline, ForceCommand};
pub use scene::BallScene;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use glam::{Vec2, Vec3};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::Window;

    use crate::controller::{InputEvent, SteeringController};
    use crate::model::{BallSpec, DetectedPlane, PlaneId};
    use crate::platform::web::DeviceMotionSource;
    use crate::platform::RunLoop;
    use crate::{logging, BallScene, FrameLoopContext, SteeringConfig};

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        logging::init();
        let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;

        let run_loop = RunLoop::new();
        let motion = DeviceMotionSource::new(window.clone());
        let steering = SteeringController::new(motion, run_loop.clone(), SteeringConfig::default());
        let mut scene = BallScene::new(steering, BallSpec::default(), VIEWPORT);

        // No plane detection in the browser: assume a floor one metre down
        let floor = Vec3::new(0.0, -1.0, -1.0);
        scene.camera_mut().set_look_at(floor);

        let mut frame_ctx = FrameLoopContext::new(run_loop, scene);
        frame_ctx.push_event(InputEvent::PlaneAdded(DetectedPlane::new(
            PlaneId(0),
            floor,
            Vec2::new(4.0, 4.0),
        )));
        frame_ctx.push_event(InputEvent::touch(VIEWPORT * 0.5));

        let mut last_ms: Option<f64> = None;
        let animation = AnimationLoop::new(window, move |now_ms| {
            let dt_ms = last_ms.map(|last| (now_ms - last).max(0.0)).unwrap_or(0.0);
            last_ms = Some(now_ms);
            frame_ctx.update(Duration::from_secs_f64(dt_ms / 1000.0));

            if frame_ctx.frames() % 60 == 0 {
                if let Some(pos) = frame_ctx.scene.ball_position() {
                    tracing::info!(x = pos.x, y = pos.y, z = pos.z, "ball");
                }
            }
        });
        animation.start()
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    /// Runs a closure on every `requestAnimationFrame`
    struct AnimationLoop {
        inner: Rc<RefCell<Box<dyn FnMut(f64)>>>,
        window: Window,
    }

    impl AnimationLoop {
        fn new(window: Window, f: impl FnMut(f64) + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) -> Result<(), JsValue> {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut(f64)>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
                inner.borrow_mut().as_mut()(now_ms);

                // Recursively schedule next frame
                let cb_ref = callback_clone.borrow();
                if let Some(cb) = cb_ref.as_ref() {
                    if let Err(err) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        tracing::error!(?err, "requestAnimationFrame failed");
                    }
                }
            }) as Box<dyn FnMut(f64)>));

            if let Some(cb) = callback.borrow().as_ref() {
                self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
            Ok(())
        }
    }
}
