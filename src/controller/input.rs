//! Platform-agnostic scene events
use glam::Vec2;

use crate::model::DetectedPlane;
use crate::model::PlaneId;

/// Everything the host platform forwards to the ball scene
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Touch released at a point in view pixels
    TouchEnded { x: f32, y: f32 },

    // Plane tracking
    PlaneAdded(DetectedPlane),
    PlaneUpdated(DetectedPlane),
    PlaneRemoved(PlaneId),

    // View lifecycle
    Resized { width: f32, height: f32 },
    Reload,
    VisibilityChanged { visible: bool },
}

impl InputEvent {
    pub fn touch(point: Vec2) -> Self {
        InputEvent::TouchEnded { x: point.x, y: point.y }
    }
}

