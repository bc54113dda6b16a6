use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box defined by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all(), "aabb min must not exceed max");
        Self { min, max }
    }

    /// Box spanning `[origin, origin + size]`.
    pub fn from_origin_size(origin: Vec3, size: Vec3) -> Self {
        Self::new(origin, origin + size)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Overlap test. Boxes that only share a face do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
    }

    /// Octant `index` of this box. Bit 2 selects +X, bit 1 selects +Y, bit 0 selects +Z.
    pub fn octant(&self, index: usize) -> Aabb {
        debug_assert!(index < 8);
        let half = self.size() * 0.5;
        let offset = Vec3::new(
            if index & 4 != 0 { half.x } else { 0.0 },
            if index & 2 != 0 { half.y } else { 0.0 },
            if index & 1 != 0 { half.z } else { 0.0 },
        );
        Aabb::from_origin_size(self.min + offset, half)
    }

    /// The corner furthest along `direction` (the "positive vertex").
    pub fn support(&self, direction: Vec3) -> Vec3 {
        Vec3::new(
            if direction.x >= 0.0 { self.max.x } else { self.min.x },
            if direction.y >= 0.0 { self.max.y } else { self.min.y },
            if direction.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }
}
