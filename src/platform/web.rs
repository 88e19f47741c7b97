//! Browser accelerometer via `devicemotion` events
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DeviceMotionEvent, Window};

use crate::model::AccelSample;
use crate::platform::MotionSource;

/// m/s² per g
const STANDARD_GRAVITY: f64 = 9.80665;

pub struct DeviceMotionSource {
    window: Window,
    latest: Rc<RefCell<Option<AccelSample>>>,
    listener: Option<Closure<dyn FnMut(DeviceMotionEvent)>>,
}

impl DeviceMotionSource {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            latest: Rc::new(RefCell::new(None)),
            listener: None,
        }
    }
}

impl MotionSource for DeviceMotionSource {
    fn is_available(&self) -> bool {
        js_sys::Reflect::has(&self.window, &JsValue::from_str("DeviceMotionEvent")).unwrap_or(false)
    }

    /// Browsers pick their own event rate, so `update_interval` is advisory
    fn start(&mut self, _update_interval: Duration) {
        if self.listener.is_some() {
            return;
        }

        let latest = self.latest.clone();
        let listener = Closure::wrap(Box::new(move |e: DeviceMotionEvent| {
            let Some(accel) = e.acceleration_including_gravity() else { return };
            // W3C axes report +1g up; flip to the "gravity is negative" convention
            let to_g = |v: Option<f64>| v.unwrap_or(0.0) / -STANDARD_GRAVITY;
            *latest.borrow_mut() = Some(AccelSample::new(
                to_g(accel.x()),
                to_g(accel.y()),
                to_g(accel.z()),
                Duration::from_secs_f64(e.time_stamp().max(0.0) / 1000.0),
            ));
        }) as Box<dyn FnMut(DeviceMotionEvent)>);

        if let Err(err) = self
            .window
            .add_event_listener_with_callback("devicemotion", listener.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, "could not listen for devicemotion");
            return;
        }
        self.listener = Some(listener);
    }

    fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("devicemotion", listener.as_ref().unchecked_ref());
        }
        *self.latest.borrow_mut() = None;
    }

    fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    fn latest_sample(&self) -> Option<AccelSample> {
        *self.latest.borrow()
    }
}
