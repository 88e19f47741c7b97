use glam::{Mat4, Vec2, Vec3};
use std::collections::HashMap;

use crate::model::camera::Ray;
use crate::platform::HitTestProvider;

/// Identifier of a detected plane anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaneId(pub u64);

/// Horizontal rectangle reported by plane detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPlane {
    pub anchor: PlaneId,
    pub center: Vec3,
    /// Full width on X and depth on Z
    pub extent: Vec2,
}

impl DetectedPlane {
    pub fn new(anchor: PlaneId, center: Vec3, extent: Vec2) -> Self {
        Self { anchor, center, extent }
    }

    pub fn height(&self) -> f32 {
        self.center.y
    }

    /// Whether (x, z) falls inside the plane's extent
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        let half = self.extent * 0.5;
        (x - self.center.x).abs() <= half.x && (z - self.center.z).abs() <= half.y
    }

    /// Distance along `ray` to the plane surface, if it is hit inside the extent
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        if ray.dir.y.abs() < 1e-6 {
            return None;
        }
        let t = (self.center.y - ray.origin.y) / ray.dir.y;
        if t <= 0.0 {
            return None;
        }
        let p = ray.at(t);
        self.contains_xz(p.x, p.z).then_some(t)
    }
}

/// Planes currently known to the tracker, keyed by anchor
#[derive(Debug, Default)]
pub struct PlaneMap {
    planes: HashMap<PlaneId, DetectedPlane>,
}

impl PlaneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plane: DetectedPlane) {
        tracing::debug!(anchor = plane.anchor.0, "plane added");
        self.planes.insert(plane.anchor, plane);
    }

    /// Replace the geometry of a plane; unknown anchors are inserted
    pub fn update(&mut self, plane: DetectedPlane) {
        self.planes.insert(plane.anchor, plane);
    }

    pub fn remove(&mut self, anchor: PlaneId) -> Option<DetectedPlane> {
        tracing::debug!(anchor = anchor.0, "plane removed");
        self.planes.remove(&anchor)
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }

    pub fn get(&self, anchor: PlaneId) -> Option<&DetectedPlane> {
        self.planes.get(&anchor)
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Highest plane under `point` whose surface is not above it
    pub fn support_below(&self, point: Vec3) -> Option<&DetectedPlane> {
        self.planes
            .values()
            .filter(|p| p.contains_xz(point.x, point.z) && p.height() <= point.y + 1e-4)
            .max_by(|a, b| a.height().total_cmp(&b.height()))
    }
}

impl HitTestProvider for PlaneMap {
    fn hit_test(&self, ray: &Ray) -> Option<Mat4> {
        self.planes
            .values()
            .filter_map(|p| p.intersect(ray))
            .min_by(|a, b| a.total_cmp(b))
            .map(|t| Mat4::from_translation(ray.at(t)))
    }
}
